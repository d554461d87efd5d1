//! Extractors whose rejections answer with the [`ApiError`] JSON body.
//!
//! A malformed id segment is reported as `404`, the same as an id with no
//! row; malformed bodies and query strings are `400`.

use axum::extract::{FromRequest, FromRequestParts, Path, Query};

use crate::error::ApiError;

/// [`axum::Json`] request body.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);

/// [`Path`] parameters.
#[derive(FromRequestParts)]
#[from_request(via(Path), rejection(ApiError))]
pub struct PathParam<T>(pub T);

/// [`Query`] parameters.
#[derive(FromRequestParts)]
#[from_request(via(Query), rejection(ApiError))]
pub struct QueryParams<T>(pub T);
