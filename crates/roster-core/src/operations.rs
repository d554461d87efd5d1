//! Person operations: validation, path selection, and mapping of store
//! outcomes to [`PersonError`].
//!
//! A person is `Active` or `SoftDeleted`. Soft delete and reactivate move
//! between the two; force delete removes the row from either state.
//!
//! | Operation | Write path |
//! |-----------|------------|
//! | create, update | explicit transaction: stage, save, commit; rollback on fault |
//! | delete one, reactivate one | single staged save (atomic on its own) |
//! | force delete many | one immediate `DELETE` statement |
//! | soft delete many, reactivate many | [`BulkMutator`], best effort |

use std::sync::Arc;

use thiserror::Error;

use crate::{
  entity::Entity,
  error::root_cause,
  person::{Person, PersonInput, columns},
  sink::{FailureEvent, FailureKind, FailureSink},
  specification::{Filter, Order, Specification},
  store::{BulkMutator, Repository, Store, Transaction},
  validate::{self, Violations},
};

// ─── Errors ──────────────────────────────────────────────────────────────────

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PersonError {
  /// The payload broke a validation rule; the store was not touched.
  #[error("{0}")]
  Invalid(Violations),

  /// No visible row matched the requested id(s).
  #[error("{0} not found")]
  NotFound(String),

  /// The store failed; carries the root-cause message. Already reported to
  /// the failure sink.
  #[error("{0}")]
  Fault(String),
}

/// Which rows [`PersonService::read_all`] returns.
///
/// Point reads always hide soft-deleted rows. The list read defaults to
/// returning every row, soft-deleted included, as an administrative view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
  #[default]
  All,
  ActiveOnly,
}

// ─── Service ─────────────────────────────────────────────────────────────────

/// Person operations over any [`Store`].
///
/// Each call opens its own repository session and drops it before
/// returning, whatever the outcome.
pub struct PersonService<S> {
  store: S,
  sink:  Arc<dyn FailureSink>,
}

impl<S: Store> PersonService<S> {
  pub fn new(store: S, sink: Arc<dyn FailureSink>) -> Self { Self { store, sink } }

  pub fn store(&self) -> &S { &self.store }

  fn report(
    &self,
    kind: FailureKind,
    operation: &'static str,
    reason: String,
  ) -> PersonError {
    self.sink.record(FailureEvent {
      kind,
      operation,
      entity: Person::NAME,
      reason: reason.clone(),
    });
    PersonError::Fault(reason)
  }

  fn fault(
    &self,
    kind: FailureKind,
    operation: &'static str,
    err: &(dyn std::error::Error + 'static),
  ) -> PersonError {
    self.report(kind, operation, root_cause(err))
  }

  /// Roll `tx` back and return `fault`. A failed rollback is reported too;
  /// the session discards its connection in that case.
  async fn abort<R: Repository>(
    &self,
    tx: Transaction<'_, R>,
    operation: &'static str,
    fault: PersonError,
  ) -> PersonError {
    if let Err(e) = tx.rollback().await {
      self.fault(FailureKind::Write, operation, &e);
    }
    fault
  }

  async fn session(
    &self,
    kind: FailureKind,
    operation: &'static str,
  ) -> Result<S::Session, PersonError> {
    self
      .store
      .session()
      .await
      .map_err(|e| self.fault(kind, operation, &e))
  }

  // ── Create / update ───────────────────────────────────────────────────

  /// Validate and insert a new active person; returns the assigned id.
  pub async fn create(&self, input: PersonInput) -> Result<i64, PersonError> {
    const OP: &str = "create";
    validate::validate_new(&input).map_err(PersonError::Invalid)?;

    let mut session = self.session(FailureKind::Write, OP).await?;
    let mut tx = session
      .begin_transaction()
      .await
      .map_err(|e| self.fault(FailureKind::Write, OP, &e))?;

    let pending = tx.add(input.into_person());
    let saved = tx.save().await;
    if let Err(e) = saved {
      let fault = self.fault(FailureKind::Write, OP, &e);
      return Err(self.abort(tx, OP, fault).await);
    }
    tx.commit()
      .await
      .map_err(|e| self.fault(FailureKind::Write, OP, &e))?;

    pending
      .get()
      .ok_or_else(|| self.report(FailureKind::Write, OP, "insert returned no key".into()))
  }

  /// Validate and overwrite name, description and email of an existing
  /// person (active or soft-deleted); returns its id.
  pub async fn update(&self, input: PersonInput) -> Result<i64, PersonError> {
    const OP: &str = "update";
    validate::validate_update(&input).map_err(PersonError::Invalid)?;
    let id = input.id;

    let mut session = self.session(FailureKind::Write, OP).await?;
    let mut tx = session
      .begin_transaction()
      .await
      .map_err(|e| self.fault(FailureKind::Write, OP, &e))?;

    let found = tx.get_by_id::<Person>(id).await;
    let mut person = match found {
      Ok(Some(p)) => p,
      Ok(None) => {
        let fault = self.report(FailureKind::Write, OP, format!("no Person with id {id}"));
        return Err(self.abort(tx, OP, fault).await);
      }
      Err(e) => {
        let fault = self.fault(FailureKind::Write, OP, &e);
        return Err(self.abort(tx, OP, fault).await);
      }
    };

    input.apply_to(&mut person);
    tx.update(person);
    let saved = tx.save().await;
    if let Err(e) = saved {
      let fault = self.fault(FailureKind::Write, OP, &e);
      return Err(self.abort(tx, OP, fault).await);
    }
    tx.commit()
      .await
      .map_err(|e| self.fault(FailureKind::Write, OP, &e))?;
    Ok(id)
  }

  // ── Reads ─────────────────────────────────────────────────────────────

  /// The active person with `id`. Soft-deleted and missing rows are both
  /// reported as not found.
  pub async fn read_one(&self, id: i64) -> Result<Person, PersonError> {
    const OP: &str = "read_one";
    let mut session = self.session(FailureKind::Read, OP).await?;
    let spec = Specification::matching(Filter::eq(columns::ID, id))
      .filter(Filter::eq(columns::IS_DELETED, false))
      .untracked();

    session
      .get::<Person>(spec)
      .await
      .map_err(|e| self.fault(FailureKind::Read, OP, &e))?
      .ok_or_else(|| PersonError::NotFound(format!("Person {id}")))
  }

  /// Every person in ascending id order, filtered by `visibility`.
  pub async fn read_all(&self, visibility: Visibility) -> Result<Vec<Person>, PersonError> {
    const OP: &str = "read_all";
    let mut session = self.session(FailureKind::Read, OP).await?;
    let mut spec = Specification::all()
      .order_by(Order::asc(columns::ID))
      .untracked();
    if visibility == Visibility::ActiveOnly {
      spec = spec.filter(Filter::eq(columns::IS_DELETED, false));
    }

    session
      .get_list::<Person>(spec)
      .await
      .map_err(|e| self.fault(FailureKind::Read, OP, &e))
  }

  // ── Delete ────────────────────────────────────────────────────────────

  /// Soft-delete the person with `id`, or remove it physically when
  /// `force` is set. Targets the row in either state.
  pub async fn delete_one(&self, id: i64, force: bool) -> Result<i64, PersonError> {
    const OP: &str = "delete_one";
    let mut session = self.session(FailureKind::Write, OP).await?;

    let mut person = session
      .get::<Person>(Specification::matching(Filter::eq(columns::ID, id)))
      .await
      .map_err(|e| self.fault(FailureKind::Write, OP, &e))?
      .ok_or_else(|| PersonError::NotFound(format!("Person {id}")))?;

    if force {
      session.remove(&person);
    } else {
      person.is_deleted = true;
      session.update(person);
    }
    session
      .save()
      .await
      .map_err(|e| self.fault(FailureKind::Write, OP, &e))?;
    Ok(id)
  }

  /// Soft-delete (or, with `force`, physically delete) every listed person
  /// that exists. Unknown ids are ignored. Returns the first listed id that
  /// matched a row.
  ///
  /// The forced path is one `DELETE` statement and therefore atomic. The
  /// soft path goes through [`BulkMutator::bulk_update`] and may stop part
  /// way through.
  pub async fn delete_many(&self, ids: &[i64], force: bool) -> Result<i64, PersonError> {
    const OP: &str = "delete_many";
    let mut session = self.session(FailureKind::Write, OP).await?;
    let people = self.load_targets(&mut session, ids, OP).await?;
    let key = first_found(ids, &people);

    if force {
      session
        .execute_delete::<Person>(Filter::is_in(columns::ID, ids.iter().copied()))
        .await
        .map_err(|e| self.fault(FailureKind::Write, OP, &e))?;
      return Ok(key);
    }

    drop(session);
    self.flip(people, true, OP).await?;
    Ok(key)
  }

  // ── Reactivate ────────────────────────────────────────────────────────

  /// Return a soft-deleted person to active. Reactivating an active person
  /// succeeds without writing.
  pub async fn reactivate_one(&self, id: i64) -> Result<i64, PersonError> {
    const OP: &str = "reactivate_one";
    let mut session = self.session(FailureKind::Write, OP).await?;

    let mut person = session
      .get_by_id::<Person>(id)
      .await
      .map_err(|e| self.fault(FailureKind::Write, OP, &e))?
      .ok_or_else(|| PersonError::NotFound(format!("Person {id}")))?;

    person.is_deleted = false;
    session.update(person);
    session
      .save()
      .await
      .map_err(|e| self.fault(FailureKind::Write, OP, &e))?;
    Ok(id)
  }

  /// Reactivate every listed person that exists through the bulk path.
  /// Unknown ids are ignored. Returns the first listed id that matched a
  /// row.
  pub async fn reactivate_many(&self, ids: &[i64]) -> Result<i64, PersonError> {
    const OP: &str = "reactivate_many";
    let mut session = self.session(FailureKind::Write, OP).await?;
    let people = self.load_targets(&mut session, ids, OP).await?;
    let key = first_found(ids, &people);

    drop(session);
    self.flip(people, false, OP).await?;
    Ok(key)
  }

  // ── Helpers ───────────────────────────────────────────────────────────

  /// Untracked load of every listed person, in any state.
  async fn load_targets(
    &self,
    session: &mut S::Session,
    ids: &[i64],
    operation: &'static str,
  ) -> Result<Vec<Person>, PersonError> {
    let spec = Specification::matching(Filter::is_in(columns::ID, ids.iter().copied()))
      .order_by(Order::asc(columns::ID))
      .untracked();
    let people = session
      .get_list::<Person>(spec)
      .await
      .map_err(|e| self.fault(FailureKind::Write, operation, &e))?;
    if people.is_empty() {
      return Err(PersonError::NotFound("Person".into()));
    }
    Ok(people)
  }

  async fn flip(
    &self,
    mut people: Vec<Person>,
    deleted: bool,
    operation: &'static str,
  ) -> Result<usize, PersonError> {
    for person in &mut people {
      person.is_deleted = deleted;
    }
    let changed = self
      .store
      .bulk_update(people)
      .await
      .map_err(|e| self.fault(FailureKind::Write, operation, &e))?;
    tracing::debug!(operation, changed, deleted, "bulk state flip");
    Ok(changed)
  }
}

/// The first id in `ids` that has a loaded row. `people` is never empty.
fn first_found(ids: &[i64], people: &[Person]) -> i64 {
  ids
    .iter()
    .copied()
    .find(|id| people.iter().any(|p| p.id == *id))
    .unwrap_or_else(|| people.first().map_or(0, |p| p.id))
}
