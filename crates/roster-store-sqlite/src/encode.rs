//! Conversions between the neutral [`Value`] of `roster-core` and
//! [`rusqlite`]'s owned SQL values.

use roster_core::entity::{Entity, Value};
use rusqlite::types::Value as SqlValue;

use crate::{Error, Result};

pub fn encode_value(value: Value) -> SqlValue {
  match value {
    Value::Null => SqlValue::Null,
    Value::Integer(i) => SqlValue::Integer(i),
    Value::Text(s) => SqlValue::Text(s),
  }
}

pub fn encode_values(values: Vec<Value>) -> Vec<SqlValue> {
  values.into_iter().map(encode_value).collect()
}

pub fn decode_value<E: Entity>(column: &'static str, value: SqlValue) -> Result<Value> {
  match value {
    SqlValue::Null => Ok(Value::Null),
    SqlValue::Integer(i) => Ok(Value::Integer(i)),
    SqlValue::Text(s) => Ok(Value::Text(s)),
    SqlValue::Real(_) => Err(Error::UnsupportedValue { entity: E::NAME, column, kind: "real" }),
    SqlValue::Blob(_) => Err(Error::UnsupportedValue { entity: E::NAME, column, kind: "blob" }),
  }
}

/// A raw `(id, columns...)` row as read from SQLite.
pub struct RawRow {
  pub id:     i64,
  pub values: Vec<SqlValue>,
}

impl RawRow {
  /// Read `id` followed by `width` column values.
  pub fn read(row: &rusqlite::Row<'_>, width: usize) -> rusqlite::Result<Self> {
    let id = row.get(0)?;
    let values = (1..=width).map(|i| row.get(i)).collect::<rusqlite::Result<_>>()?;
    Ok(Self { id, values })
  }

  pub fn into_entity<E: Entity>(self) -> Result<E> {
    let values = E::COLUMNS
      .iter()
      .zip(self.values)
      .map(|(column, value)| decode_value::<E>(column.name, value))
      .collect::<Result<Vec<_>>>()?;
    Ok(E::from_row(self.id, values)?)
  }
}
