//! Core types and trait definitions for the roster record service.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Storage backends implement [`store::Store`]; the HTTP layer drives
//! [`operations::PersonService`].

// Native `async fn` in traits; the traits spell out `Send` futures by hand.
#![allow(async_fn_in_trait)]

pub mod bootstrap;
pub mod entity;
pub mod error;
pub mod operations;
pub mod person;
pub mod sink;
pub mod specification;
pub mod store;
pub mod validate;

pub use error::{Error, Result};
