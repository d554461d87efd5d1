//! Error type for `roster-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] roster_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  /// A specification named a column the entity does not have.
  #[error("{entity} has no column {column:?}")]
  UnknownColumn {
    entity: &'static str,
    column: &'static str,
  },

  /// A stored value had a type no entity column uses.
  #[error("column {column} of {entity} holds an unsupported {kind} value")]
  UnsupportedValue {
    entity: &'static str,
    column: &'static str,
    kind:   &'static str,
  },

  /// A staged update or delete found no row to change.
  #[error("{entity} with id {id} does not exist")]
  StaleRow { entity: &'static str, id: i64 },

  #[error("a transaction is already open on this session")]
  TransactionOpen,

  #[error("no transaction is open on this session")]
  NoTransaction,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
