//! Handlers for `/request` endpoints — the connection ledger.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/request/send/{status}/{receiver_id}` | `status`: `interested` or `ignored` |
//! | `POST` | `/request/review/{status}/{request_id}` | `status`: `accepted` or `rejected`; receiver only |

use axum::extract::State;
use serde_json::{Value, json};
use tandem_core::{
  connection::{ConnectionStatus, RespondRequest, SendRequest},
  store::TandemStore,
};
use uuid::Uuid;

use crate::{
  AppState,
  auth::CurrentUser,
  error::ApiError,
  extract::{Json, Path},
};

/// `POST /request/send/{status}/{receiver_id}`
pub async fn send<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Path((status, receiver_id)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError>
where
  S: TandemStore + Clone + Send + Sync + 'static,
{
  let status: ConnectionStatus = status.parse()?;
  let receiver_id = Uuid::parse_str(&receiver_id)
    .map_err(|_| ApiError::Validation("invalid receiver id".into()))?;
  let input = SendRequest::new(user.user_id, receiver_id, status)?;

  let record = state
    .store
    .send_request(input)
    .await
    .map_err(ApiError::from_store)?;

  Ok(Json(json!({
    "message": format!("{status} saved successfully"),
    "data": record,
  })))
}

/// `POST /request/review/{status}/{request_id}`
///
/// Only the receiver of a pending request can answer it. Any other caller
/// gets the same 404 as for a request that does not exist.
pub async fn review<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Path((status, request_id)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError>
where
  S: TandemStore + Clone + Send + Sync + 'static,
{
  let status: ConnectionStatus = status.parse()?;
  let request_id = Uuid::parse_str(&request_id)
    .map_err(|_| ApiError::from(tandem_core::Error::RequestNotFound(Uuid::nil())))?;
  let input = RespondRequest::new(request_id, user.user_id, status)?;

  let record = state
    .store
    .respond_to_request(input)
    .await
    .map_err(ApiError::from_store)?;

  Ok(Json(json!({ "message": "Status updated successfully", "data": record })))
}
