//! The [`Entity`] trait: a compile-time description of a persisted record.
//!
//! Backends never inspect concrete types. They see a table name, a column
//! list and a row of neutral [`Value`]s, so one repository implementation
//! serves every entity without runtime reflection.

use chrono::{DateTime, Utc};

use crate::{Error, Result};

/// Name of the primary-key column shared by every entity.
pub const ID: &str = "id";

// ─── Value ───────────────────────────────────────────────────────────────────

/// A storage-neutral column value.
///
/// Booleans are stored as `0`/`1` integers and timestamps as RFC 3339 text,
/// matching what the SQLite backend writes.
#[derive(Debug, Clone, PartialEq, PartialOrd)]
pub enum Value {
  Null,
  Integer(i64),
  Text(String),
}

impl From<i64> for Value {
  fn from(v: i64) -> Self { Self::Integer(v) }
}

impl From<bool> for Value {
  fn from(v: bool) -> Self { Self::Integer(i64::from(v)) }
}

impl From<&str> for Value {
  fn from(v: &str) -> Self { Self::Text(v.to_owned()) }
}

impl From<String> for Value {
  fn from(v: String) -> Self { Self::Text(v) }
}

impl From<DateTime<Utc>> for Value {
  fn from(v: DateTime<Utc>) -> Self { Self::Text(v.to_rfc3339()) }
}

impl<T: Into<Value>> From<Option<T>> for Value {
  fn from(v: Option<T>) -> Self { v.map_or(Self::Null, Into::into) }
}

// ─── Column ──────────────────────────────────────────────────────────────────

/// A non-key column of an entity table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
  pub name:    &'static str,
  /// Immutable columns are written on insert and never by an update.
  pub mutable: bool,
}

impl Column {
  pub const fn mutable(name: &'static str) -> Self { Self { name, mutable: true } }

  pub const fn fixed(name: &'static str) -> Self { Self { name, mutable: false } }
}

// ─── Entity ──────────────────────────────────────────────────────────────────

/// A record type the repository can persist.
///
/// The primary key is always an integer `id` assigned by the store; it is
/// not part of [`Entity::COLUMNS`]. An `id` of `0` means "not yet stored".
pub trait Entity: Clone + Send + Sync + 'static {
  /// Table the rows live in.
  const TABLE: &'static str;
  /// Human-readable entity name used in failure reports.
  const NAME: &'static str;
  /// Every column except `id`, in the order [`Entity::values`] yields them.
  const COLUMNS: &'static [Column];

  fn id(&self) -> i64;

  /// Column values aligned with [`Entity::COLUMNS`].
  fn values(&self) -> Vec<Value>;

  /// Rebuild an instance from its key and a row aligned with
  /// [`Entity::COLUMNS`].
  fn from_row(id: i64, values: Vec<Value>) -> Result<Self>;

  /// The current value of `column`, or `None` if the entity has no such
  /// column. Used to evaluate filters without a store.
  fn field(&self, column: &str) -> Option<Value> {
    if column == ID {
      return Some(Value::Integer(self.id()));
    }
    let index = Self::COLUMNS.iter().position(|c| c.name == column)?;
    self.values().into_iter().nth(index)
  }

  /// The subset of [`Entity::values`] an update is allowed to write.
  fn mutable_values(&self) -> Vec<Value> {
    Self::COLUMNS
      .iter()
      .zip(self.values())
      .filter(|(c, _)| c.mutable)
      .map(|(_, v)| v)
      .collect()
  }

  /// Whether `column` names the key or one of [`Entity::COLUMNS`].
  fn has_column(column: &str) -> bool {
    column == ID || Self::COLUMNS.iter().any(|c| c.name == column)
  }
}

// ─── Row decoding ────────────────────────────────────────────────────────────

/// Sequential reader over a stored row, used by [`Entity::from_row`]
/// implementations.
pub struct Row {
  entity:  &'static str,
  columns: std::slice::Iter<'static, Column>,
  values:  std::vec::IntoIter<Value>,
}

impl Row {
  /// Check the row's width against `E::COLUMNS` and start reading.
  pub fn new<E: Entity>(id: i64, values: Vec<Value>) -> Result<Self> {
    if values.len() != E::COLUMNS.len() {
      return Err(Error::RowShape {
        entity: E::NAME,
        id,
        found: values.len(),
        expected: E::COLUMNS.len(),
      });
    }
    Ok(Self {
      entity:  E::NAME,
      columns: E::COLUMNS.iter(),
      values:  values.into_iter(),
    })
  }

  fn next(&mut self) -> (&'static str, Value) {
    let column = self.columns.next().map_or("?", |c| c.name);
    (column, self.values.next().unwrap_or(Value::Null))
  }

  fn mismatch(&self, column: &'static str) -> Error {
    Error::ColumnType { entity: self.entity, column }
  }

  pub fn text(&mut self) -> Result<String> {
    match self.next() {
      (_, Value::Text(s)) => Ok(s),
      (column, _) => Err(self.mismatch(column)),
    }
  }

  pub fn optional_text(&mut self) -> Result<Option<String>> {
    match self.next() {
      (_, Value::Text(s)) => Ok(Some(s)),
      (_, Value::Null) => Ok(None),
      (column, _) => Err(self.mismatch(column)),
    }
  }

  pub fn flag(&mut self) -> Result<bool> {
    match self.next() {
      (_, Value::Integer(i)) => Ok(i != 0),
      (column, _) => Err(self.mismatch(column)),
    }
  }

  pub fn timestamp(&mut self) -> Result<DateTime<Utc>> {
    match self.next() {
      (_, Value::Text(s)) => DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::DateParse(e.to_string())),
      (column, _) => Err(self.mismatch(column)),
    }
  }
}
