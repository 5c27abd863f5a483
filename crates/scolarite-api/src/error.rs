//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use scolarite_core::Error;
use serde_json::json;
use thiserror::Error as ThisError;

/// An error returned by an API handler.
#[derive(Debug, ThisError)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("internal error: {0}")]
  Internal(String),
}

/// Map domain errors onto HTTP statuses. Not-found lookups are 404, a
/// duplicate email is 409, state and guard rejections (including duplicate
/// years and double closes) are 400, and infrastructure failures are 500.
impl From<Error> for ApiError {
  fn from(e: Error) -> Self {
    match e {
      Error::StudentNotFound(_) | Error::EnrollmentNotFound(_) => {
        ApiError::NotFound(e.to_string())
      },
      Error::DuplicateEmail(_) => ApiError::Conflict(e.to_string()),
      Error::Storage(_)
      | Error::Serialization(_)
      | Error::IdentifierGeneration { .. } => ApiError::Internal(e.to_string()),
      Error::InvalidTransition { .. }
      | Error::NotActive { .. }
      | Error::DuplicateEnrollment { .. }
      | Error::AlreadyClosed { .. }
      | Error::InvalidAcademicYear(_)
      | Error::NotAlumni(_)
      | Error::ReenrollmentExcluded(_)
      | Error::ReenrollmentPending(_) => ApiError::BadRequest(e.to_string()),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
      ApiError::Internal(m) => (StatusCode::INTERNAL_SERVER_ERROR, m.clone()),
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
