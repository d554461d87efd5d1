//! Storage abstractions: [`Store`], [`Repository`] and [`BulkMutator`].
//!
//! Traits are implemented by storage backends (e.g. `roster-store-sqlite`).
//! [`crate::operations`] depends on these abstractions, not on any concrete
//! backend.
//!
//! All methods return `Send` futures so the traits can be used in
//! multi-threaded async runtimes (e.g. tokio with `axum`).

use std::{
  future::Future,
  ops::{Deref, DerefMut},
  sync::{Arc, OnceLock},
};

use crate::{entity::Entity, specification::Filter, specification::Specification};

// ─── PendingId ───────────────────────────────────────────────────────────────

/// The key of a staged insert, filled in by the [`Repository::save`] that
/// writes it.
#[derive(Debug, Clone, Default)]
pub struct PendingId(Arc<OnceLock<i64>>);

impl PendingId {
  pub fn new() -> Self { Self::default() }

  /// `None` until the insert has been saved.
  pub fn get(&self) -> Option<i64> { self.0.get().copied() }

  /// Record the assigned key. Later calls are ignored; keys never change.
  pub fn resolve(&self, id: i64) { let _ = self.0.set(id); }
}

// ─── Repository ──────────────────────────────────────────────────────────────

/// A unit of work over one store connection.
///
/// Writes are staged with [`add`](Self::add), [`update`](Self::update) and
/// [`remove`](Self::remove) and reach the store together on
/// [`save`](Self::save). [`execute_delete`](Self::execute_delete) is the
/// exception: it runs immediately.
///
/// Outside an explicit transaction each `save` is atomic on its own. Inside
/// one (see [`Repository::begin_transaction`]) nothing is durable until the
/// transaction commits.
pub trait Repository: Send {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// The first row matching `spec`, or `None`.
  fn get<E: Entity>(
    &mut self,
    spec: Specification,
  ) -> impl Future<Output = Result<Option<E>, Self::Error>> + Send + '_;

  /// Tracked point lookup by primary key.
  fn get_by_id<E: Entity>(
    &mut self,
    id: i64,
  ) -> impl Future<Output = Result<Option<E>, Self::Error>> + Send + '_;

  /// Every row matching `spec`, in `spec` order. Empty if none match.
  fn get_list<E: Entity>(
    &mut self,
    spec: Specification,
  ) -> impl Future<Output = Result<Vec<E>, Self::Error>> + Send + '_;

  /// Whether at least one row of `E` exists.
  fn exists<E: Entity>(
    &mut self,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Staged writes ─────────────────────────────────────────────────────

  /// Stage an insert. The returned handle receives the key on save.
  fn add<E: Entity>(&mut self, entity: E) -> PendingId;

  /// Stage a full-row update keyed by `entity.id()`. Immutable columns are
  /// not written.
  fn update<E: Entity>(&mut self, entity: E);

  /// Stage a physical delete keyed by `entity.id()`.
  fn remove<E: Entity>(&mut self, entity: &E);

  /// Flush every staged write as one unit and return the number of rows
  /// affected. An update or delete that finds no row fails the whole save.
  fn save(&mut self) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  // ── Immediate writes ──────────────────────────────────────────────────

  /// Physically delete every row of `E` matching `filter`, now, in one
  /// statement. Staged writes are untouched.
  fn execute_delete<E: Entity>(
    &mut self,
    filter: Filter,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  // ── Transactions ──────────────────────────────────────────────────────

  /// Open an explicit transaction on this session's connection.
  ///
  /// Prefer [`Repository::begin_transaction`], which scopes the
  /// transaction to a guard.
  fn begin(&mut self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn commit(&mut self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn rollback(&mut self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Called when a [`Transaction`] guard is dropped without commit or
  /// rollback. Implementations must ensure the open transaction never
  /// becomes durable and the connection is not reused with it still open.
  fn abandon(&mut self);

  /// Open a transaction scoped to the returned guard.
  fn begin_transaction(
    &mut self,
  ) -> impl Future<Output = Result<Transaction<'_, Self>, Self::Error>> + Send + '_
  where
    Self: Sized,
  {
    async move {
      self.begin().await?;
      Ok(Transaction { repo: self, finished: false })
    }
  }
}

// ─── Transaction ─────────────────────────────────────────────────────────────

/// An open transaction. Dereferences to the repository it was opened on.
///
/// Consumed by [`commit`](Self::commit) or [`rollback`](Self::rollback);
/// dropping it unfinished hands the session to [`Repository::abandon`].
#[must_use = "a dropped transaction is abandoned and rolled back"]
pub struct Transaction<'r, R: Repository> {
  repo:     &'r mut R,
  finished: bool,
}

impl<R: Repository> Transaction<'_, R> {
  pub async fn commit(mut self) -> Result<(), R::Error> {
    self.repo.commit().await?;
    self.finished = true;
    Ok(())
  }

  pub async fn rollback(mut self) -> Result<(), R::Error> {
    self.repo.rollback().await?;
    self.finished = true;
    Ok(())
  }
}

impl<R: Repository> Deref for Transaction<'_, R> {
  type Target = R;

  fn deref(&self) -> &R { self.repo }
}

impl<R: Repository> DerefMut for Transaction<'_, R> {
  fn deref_mut(&mut self) -> &mut R { self.repo }
}

impl<R: Repository> Drop for Transaction<'_, R> {
  fn drop(&mut self) {
    if !self.finished {
      self.repo.abandon();
    }
  }
}

// ─── BulkMutator ─────────────────────────────────────────────────────────────

/// Batched writes that bypass the staged/transactional protocol.
///
/// # Atomicity
///
/// Best effort, not all-or-nothing. The batch travels to the store in one
/// round trip but every row is its own statement with no surrounding
/// transaction. The first failing row stops the batch and is reported as an
/// error; rows written before it stay written.
pub trait BulkMutator: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Write the current mutable column values of every entity, keyed by id.
  /// Returns the number of rows changed. Ids with no row are skipped.
  fn bulk_update<E: Entity>(
    &self,
    entities: Vec<E>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A store handle: hands out per-operation repository sessions and owns the
/// bulk write path.
///
/// Sessions release their connection when dropped, on every exit path.
pub trait Store: BulkMutator + Send + Sync {
  type Session: Repository<Error = <Self as BulkMutator>::Error>;

  fn session(
    &self,
  ) -> impl Future<Output = Result<Self::Session, <Self as BulkMutator>::Error>>
  + Send
  + '_;
}

#[cfg(test)]
mod tests {
  use super::*;

  /// Records transaction calls; reads and writes are inert.
  #[derive(Default)]
  struct Recorder {
    calls: Vec<&'static str>,
  }

  impl Repository for Recorder {
    type Error = std::io::Error;

    async fn get<E: Entity>(&mut self, _: Specification) -> Result<Option<E>, Self::Error> {
      Ok(None)
    }

    async fn get_by_id<E: Entity>(&mut self, _: i64) -> Result<Option<E>, Self::Error> {
      Ok(None)
    }

    async fn get_list<E: Entity>(&mut self, _: Specification) -> Result<Vec<E>, Self::Error> {
      Ok(Vec::new())
    }

    async fn exists<E: Entity>(&mut self) -> Result<bool, Self::Error> { Ok(false) }

    fn add<E: Entity>(&mut self, _: E) -> PendingId { PendingId::new() }

    fn update<E: Entity>(&mut self, _: E) {}

    fn remove<E: Entity>(&mut self, _: &E) {}

    async fn save(&mut self) -> Result<usize, Self::Error> { Ok(0) }

    async fn execute_delete<E: Entity>(&mut self, _: Filter) -> Result<usize, Self::Error> {
      Ok(0)
    }

    async fn begin(&mut self) -> Result<(), Self::Error> {
      self.calls.push("begin");
      Ok(())
    }

    async fn commit(&mut self) -> Result<(), Self::Error> {
      self.calls.push("commit");
      Ok(())
    }

    async fn rollback(&mut self) -> Result<(), Self::Error> {
      self.calls.push("rollback");
      Ok(())
    }

    fn abandon(&mut self) { self.calls.push("abandon"); }
  }

  #[tokio::test]
  async fn finished_transactions_are_not_abandoned() {
    let mut repo = Recorder::default();
    repo.begin_transaction().await.unwrap().commit().await.unwrap();
    repo.begin_transaction().await.unwrap().rollback().await.unwrap();
    assert_eq!(repo.calls, ["begin", "commit", "begin", "rollback"]);
  }

  #[tokio::test]
  async fn dropped_transaction_is_abandoned() {
    let mut repo = Recorder::default();
    {
      let _tx = repo.begin_transaction().await.unwrap();
    }
    assert_eq!(repo.calls, ["begin", "abandon"]);
  }

  #[test]
  fn pending_id_resolves_once() {
    let id = PendingId::new();
    let seen_by_caller = id.clone();
    assert_eq!(seen_by_caller.get(), None);
    id.resolve(7);
    id.resolve(8);
    assert_eq!(seen_by_caller.get(), Some(7));
  }
}
