//! Request extractors whose rejections are reported as [`ApiError`]s, so a
//! malformed body, path or query string gets the usual JSON error body.

use axum::{
  extract::{FromRequest, FromRequestParts},
  response::{IntoResponse, Response},
};

use crate::error::ApiError;

/// [`axum::Json`] with an [`ApiError`] rejection. Also usable as a response.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct Json<T>(pub T);

impl<T> IntoResponse for Json<T>
where
  axum::Json<T>: IntoResponse,
{
  fn into_response(self) -> Response { axum::Json(self.0).into_response() }
}

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct Path<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct Query<T>(pub T);
