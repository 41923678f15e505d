//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  extract::rejection::{JsonRejection, PathRejection, QueryRejection},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use tandem_core::{Classify, ErrorKind};
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("{0}")]
  Validation(String),

  #[error("{0}")]
  Conflict(String),

  #[error("{0}")]
  NotFound(String),

  #[error("{0}")]
  Unauthorized(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Map any store or core error onto the API taxonomy by its kind.
  pub fn from_store<E>(e: E) -> Self
  where
    E: std::error::Error + Classify + Send + Sync + 'static,
  {
    match e.kind() {
      ErrorKind::Validation => Self::Validation(e.to_string()),
      ErrorKind::Conflict => Self::Conflict(e.to_string()),
      ErrorKind::NotFound => Self::NotFound(e.to_string()),
      ErrorKind::Unauthorized => Self::Unauthorized(e.to_string()),
      ErrorKind::Store => Self::Store(Box::new(e)),
    }
  }

  pub fn invalid_credentials() -> Self {
    Self::from_store(tandem_core::Error::InvalidCredentials)
  }

  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::Validation(_) => ErrorKind::Validation,
      Self::Conflict(_) => ErrorKind::Conflict,
      Self::NotFound(_) => ErrorKind::NotFound,
      Self::Unauthorized(_) => ErrorKind::Unauthorized,
      Self::Store(_) => ErrorKind::Store,
    }
  }

  pub fn status(&self) -> StatusCode {
    match self.kind() {
      // Duplicates are reported as a bad request, like other rejected input.
      ErrorKind::Validation | ErrorKind::Conflict => StatusCode::BAD_REQUEST,
      ErrorKind::NotFound => StatusCode::NOT_FOUND,
      ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
      ErrorKind::Store => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl From<tandem_core::Error> for ApiError {
  fn from(e: tandem_core::Error) -> Self { Self::from_store(e) }
}

impl From<JsonRejection> for ApiError {
  fn from(r: JsonRejection) -> Self { Self::Validation(r.body_text()) }
}

impl From<PathRejection> for ApiError {
  fn from(r: PathRejection) -> Self { Self::Validation(r.body_text()) }
}

impl From<QueryRejection> for ApiError {
  fn from(r: QueryRejection) -> Self { Self::Validation(r.body_text()) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    let message = match &self {
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store failure");
        "internal error".to_string()
      }
      other => {
        tracing::debug!(kind = ?other.kind(), error = %other, "request rejected");
        other.to_string()
      }
    };
    (status, Json(json!({ "error": self.kind(), "message": message })))
      .into_response()
  }
}
