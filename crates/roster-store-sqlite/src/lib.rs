//! SQLite backend for the roster store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on dedicated
//! connection threads without blocking the async runtime. Each repository
//! session owns one pooled connection for its lifetime.

mod encode;
mod query;
mod schema;
mod session;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use session::Session;
pub use store::SqliteStore;
