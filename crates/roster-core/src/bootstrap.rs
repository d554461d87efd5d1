//! Seed-on-empty startup step.

use crate::{
  entity::Entity,
  error::root_cause,
  person::Person,
  sink::{FailureEvent, FailureKind, FailureSink},
  store::{Repository, Store},
};

/// Insert the people produced by `seed` if the person table is empty.
///
/// Returns how many rows were inserted. Store failures are reported to
/// `sink` as initialisation failures and never abort startup; the seed is
/// written in one save, so a failure leaves the table empty.
pub async fn seed_if_empty<S, F>(store: &S, sink: &dyn FailureSink, seed: F) -> usize
where
  S: Store,
  F: FnOnce() -> Vec<Person>,
{
  match try_seed(store, seed).await {
    Ok(count) => count,
    Err(e) => {
      sink.record(FailureEvent {
        kind:      FailureKind::Initialize,
        operation: "bootstrap",
        entity:    Person::NAME,
        reason:    root_cause(&e),
      });
      0
    }
  }
}

async fn try_seed<S, F>(
  store: &S,
  seed: F,
) -> Result<usize, <S::Session as Repository>::Error>
where
  S: Store,
  F: FnOnce() -> Vec<Person>,
{
  let mut session = store.session().await?;
  if session.exists::<Person>().await? {
    return Ok(0);
  }
  for person in seed() {
    session.add(person);
  }
  let inserted = session.save().await?;
  tracing::info!(inserted, "seeded empty person table");
  Ok(inserted)
}
