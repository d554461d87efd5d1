//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  extract::rejection::{JsonRejection, PathRejection, QueryRejection},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use roster_core::operations::PersonError;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
///
/// Each route answers failures with one fixed status, whatever the
/// [`PersonError`] variant: write routes use `400`, read and delete routes
/// use `404`.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),
}

impl ApiError {
  pub fn bad_request(err: PersonError) -> Self { Self::BadRequest(err.to_string()) }

  pub fn not_found(err: PersonError) -> Self { Self::NotFound(err.to_string()) }
}

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self { Self::BadRequest(rejection.body_text()) }
}

impl From<QueryRejection> for ApiError {
  fn from(rejection: QueryRejection) -> Self { Self::BadRequest(rejection.body_text()) }
}

impl From<PathRejection> for ApiError {
  fn from(rejection: PathRejection) -> Self { Self::NotFound(rejection.body_text()) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
