//! Handlers for `/profile` endpoints.
//!
//! | Method  | Path | Notes |
//! |---------|------|-------|
//! | `GET`   | `/profile` | The caller's own user record |
//! | `PATCH` | `/profile/edit` | Partial update; `email` and `password` are refused |

use axum::extract::State;
use serde_json::{Value, json};
use tandem_core::{store::TandemStore, user::{ProfilePatch, User}};

use crate::{AppState, auth::CurrentUser, error::ApiError, extract::Json};

/// `GET /profile`
pub async fn view(CurrentUser(user): CurrentUser) -> Json<User> { Json(user) }

/// `PATCH /profile/edit`
pub async fn edit<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError>
where
  S: TandemStore + Clone + Send + Sync + 'static,
{
  let patch = ProfilePatch::from_json(body)?;
  let updated = state
    .store
    .update_profile(user.user_id, patch)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(json!({ "message": "User updated successfully", "user": updated })))
}
