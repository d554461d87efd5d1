//! The managed records: [`Person`] and the inert [`Account`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  Result,
  entity::{Column, Entity, Row, Value},
};

// ─── Person ──────────────────────────────────────────────────────────────────

/// A person record.
///
/// A person is either active or soft-deleted (`is_deleted`). Soft-deleted
/// rows stay in the table and are hidden from point reads; only a force
/// delete removes them physically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
  /// Store-assigned; `0` until the first save.
  pub id:           i64,
  pub name:         String,
  pub description:  Option<String>,
  pub email:        Option<String>,
  pub is_deleted:   bool,
  /// Set once at creation; updates never write it.
  pub created_date: DateTime<Utc>,
}

impl Person {
  /// A new, unsaved, active person created now.
  pub fn new(
    name: impl Into<String>,
    description: Option<String>,
    email: Option<String>,
  ) -> Self {
    Self {
      id: 0,
      name: name.into(),
      description,
      email,
      is_deleted: false,
      created_date: Utc::now(),
    }
  }

  pub fn is_active(&self) -> bool { !self.is_deleted }
}

impl Entity for Person {
  const TABLE: &'static str = "person";
  const NAME: &'static str = "Person";
  const COLUMNS: &'static [Column] = &[
    Column::mutable("name"),
    Column::mutable("description"),
    Column::mutable("email"),
    Column::mutable("is_deleted"),
    Column::fixed("created_date"),
  ];

  fn id(&self) -> i64 { self.id }

  fn values(&self) -> Vec<Value> {
    vec![
      self.name.clone().into(),
      self.description.clone().into(),
      self.email.clone().into(),
      self.is_deleted.into(),
      self.created_date.into(),
    ]
  }

  fn from_row(id: i64, values: Vec<Value>) -> Result<Self> {
    let mut row = Row::new::<Self>(id, values)?;
    Ok(Self {
      id,
      name: row.text()?,
      description: row.optional_text()?,
      email: row.optional_text()?,
      is_deleted: row.flag()?,
      created_date: row.timestamp()?,
    })
  }
}

/// Column names usable in [`crate::specification::Filter`]s over people.
pub mod columns {
  pub use crate::entity::ID;

  pub const NAME: &str = "name";
  pub const IS_DELETED: &str = "is_deleted";
}

// ─── PersonInput ─────────────────────────────────────────────────────────────

/// Payload accepted by create and update.
///
/// Create ignores `id`; update requires it to be non-zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonInput {
  #[serde(default)]
  pub id:          i64,
  #[serde(default)]
  pub name:        String,
  pub description: Option<String>,
  pub email:       Option<String>,
}

impl PersonInput {
  pub fn new(name: impl Into<String>) -> Self {
    Self { name: name.into(), ..Self::default() }
  }

  pub fn with_email(mut self, email: impl Into<String>) -> Self {
    self.email = Some(email.into());
    self
  }

  pub fn with_description(mut self, description: impl Into<String>) -> Self {
    self.description = Some(description.into());
    self
  }

  /// Build the row a create inserts.
  ///
  /// Empty optional fields are stored as absent.
  pub fn into_person(self) -> Person {
    Person::new(self.name, non_empty(self.description), non_empty(self.email))
  }

  /// Overwrite the editable fields of `person`, storing empty optional
  /// fields as absent.
  pub fn apply_to(self, person: &mut Person) {
    person.name = self.name;
    person.description = non_empty(self.description);
    person.email = non_empty(self.email);
  }
}

fn non_empty(value: Option<String>) -> Option<String> { value.filter(|v| !v.is_empty()) }

// ─── Account ─────────────────────────────────────────────────────────────────

/// A stored credential pair. Nothing in the service reads or writes it; the
/// table exists alongside `person`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
  pub id:        i64,
  pub user_name: String,
  pub password:  String,
}

impl Entity for Account {
  const TABLE: &'static str = "account";
  const NAME: &'static str = "Account";
  const COLUMNS: &'static [Column] =
    &[Column::mutable("user_name"), Column::mutable("password")];

  fn id(&self) -> i64 { self.id }

  fn values(&self) -> Vec<Value> {
    vec![self.user_name.clone().into(), self.password.clone().into()]
  }

  fn from_row(id: i64, values: Vec<Value>) -> Result<Self> {
    let mut row = Row::new::<Self>(id, values)?;
    Ok(Self { id, user_name: row.text()?, password: row.text()? })
  }
}
