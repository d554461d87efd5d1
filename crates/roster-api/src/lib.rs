//! JSON REST API for the roster service.
//!
//! Exposes an axum [`Router`] backed by a [`PersonService`] over any
//! [`Store`]. Auth, TLS, and transport concerns are the caller's
//! responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = roster_api::person_router(Arc::new(service));
//! ```

pub mod error;
pub mod extract;
pub mod people;

use std::sync::Arc;

use axum::{
  Router,
  routing::{delete, get, patch, post, put},
};
use roster_core::{operations::PersonService, store::Store};

pub use error::ApiError;

/// Build the `/person` router for `service`.
///
/// The returned `Router<()>` can be nested into or merged with any parent
/// router regardless of its own state type.
pub fn person_router<S>(service: Arc<PersonService<S>>) -> Router<()>
where
  S: Store + 'static,
{
  Router::new()
    .route("/person", get(people::list::<S>))
    .route("/person/{id}", get(people::get_one::<S>))
    .route("/person/add", post(people::create::<S>))
    .route("/person/save", patch(people::update::<S>))
    .route("/person/delete", delete(people::delete_many::<S>))
    .route("/person/delete/{id}", delete(people::delete_one::<S>))
    .route("/person/active", put(people::reactivate_many::<S>))
    .route("/person/active/{id}", put(people::reactivate_one::<S>))
    .with_state(service)
}
