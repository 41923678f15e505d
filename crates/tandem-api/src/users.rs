//! Handlers for `/user` endpoints — listings for the caller.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/user/requests/received` | Pending requests addressed to the caller |
//! | `GET`  | `/user/connections` | Accepted connections, either direction |
//! | `GET`  | `/user/feed` | `?page=&limit=`; defaults 1 and 10 |

use axum::extract::State;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tandem_core::{
  feed::{FeedPage, PageRequest},
  store::TandemStore,
};

use crate::{
  AppState,
  auth::CurrentUser,
  error::ApiError,
  extract::{Json, Query},
};

/// `GET /user/requests/received`
pub async fn received<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
) -> Result<Json<Value>, ApiError>
where
  S: TandemStore + Clone + Send + Sync + 'static,
{
  let requests = state
    .store
    .received_requests(user.user_id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(json!({ "message": "Connection requests found", "data": requests })))
}

/// `GET /user/connections`
pub async fn connections<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
) -> Result<Json<Value>, ApiError>
where
  S: TandemStore + Clone + Send + Sync + 'static,
{
  let profiles = state
    .store
    .connections(user.user_id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(json!({ "message": "Connections fetched successfully", "data": profiles })))
}

/// Raw query values; anything unparsable falls back to the defaults.
#[derive(Debug, Deserialize, Default)]
pub struct FeedParams {
  pub page:  Option<String>,
  pub limit: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FeedResponse {
  pub message: &'static str,
  #[serde(flatten)]
  pub page:    FeedPage,
}

/// `GET /user/feed[?page=<n>][&limit=<n>]`
pub async fn feed<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Query(params): Query<FeedParams>,
) -> Result<Json<FeedResponse>, ApiError>
where
  S: TandemStore + Clone + Send + Sync + 'static,
{
  let request = PageRequest::from_raw(params.page.as_deref(), params.limit.as_deref());
  let page = state
    .store
    .feed(user.user_id, request)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(FeedResponse { message: "Feed fetched successfully", page }))
}
