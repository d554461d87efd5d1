//! Error types for `roster-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("{entity} row {id} has {found} columns, expected {expected}")]
  RowShape {
    entity:   &'static str,
    id:       i64,
    found:    usize,
    expected: usize,
  },

  #[error("column {column:?} of {entity} holds an unexpected value")]
  ColumnType {
    entity: &'static str,
    column: &'static str,
  },

  #[error("date/time parse error: {0}")]
  DateParse(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The message of the innermost error in `err`'s source chain.
///
/// Store faults are reported to callers by their root cause, not by the
/// layers of context wrapped around it.
pub fn root_cause(err: &(dyn std::error::Error + 'static)) -> String {
  let mut current = err;
  while let Some(next) = current.source() {
    current = next;
  }
  current.to_string()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[derive(Debug, Error)]
  #[error("outer")]
  struct Outer(#[source] Inner);

  #[derive(Debug, Error)]
  #[error("CHECK constraint failed: name")]
  struct Inner;

  #[test]
  fn root_cause_walks_to_innermost_source() {
    assert_eq!(root_cause(&Outer(Inner)), "CHECK constraint failed: name");
  }

  #[test]
  fn root_cause_of_leaf_is_its_own_message() {
    assert_eq!(root_cause(&Inner), "CHECK constraint failed: name");
  }
}
