//! Handlers for `/auth` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/auth/signup` | Body: [`SignupBody`]; returns 201 + user |
//! | `POST` | `/auth/login`  | Body: `{"login": "...", "password": "..."}`; sets the session cookie |
//! | `POST` | `/auth/logout` | Clears the session cookie; always succeeds |

use axum::{
  extract::State,
  http::{HeaderMap, StatusCode, header},
  response::{AppendHeaders, IntoResponse},
};
use serde::Deserialize;
use serde_json::json;
use tandem_core::{
  session::Session,
  store::TandemStore,
  user::{LoginHandle, NewUser, validate_password},
};

use crate::{
  AppState,
  auth::{
    cleared_cookie, generate_token, hash_password, session_cookie,
    token_digest, token_from_headers, verify_password,
  },
  error::ApiError,
  extract::Json,
};

// ─── Signup ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SignupBody {
  #[serde(flatten)]
  pub user:     NewUser,
  pub password: String,
}

/// `POST /auth/signup`
pub async fn signup<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<SignupBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: TandemStore + Clone + Send + Sync + 'static,
{
  validate_password(&body.password)?;
  let input = body.user.validate()?;
  let password_hash = hash_password(&body.password)?;

  let user = state
    .store
    .create_user(input, password_hash)
    .await
    .map_err(ApiError::from_store)?;

  Ok((
    StatusCode::CREATED,
    Json(json!({ "message": "User created successfully", "user": user })),
  ))
}

// ─── Login ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  /// Email address or mobile number.
  pub login:    String,
  pub password: String,
}

/// `POST /auth/login`
///
/// The user is looked up before any password comparison; an unknown user and
/// a wrong password produce the same error.
pub async fn login<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<LoginBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: TandemStore + Clone + Send + Sync + 'static,
{
  let handle = LoginHandle::parse(&body.login)?;
  if body.password.is_empty() {
    return Err(ApiError::invalid_credentials());
  }

  let credentials = state
    .store
    .find_credentials(&handle)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(ApiError::invalid_credentials)?;

  if !verify_password(&body.password, &credentials.password_hash) {
    return Err(ApiError::invalid_credentials());
  }

  let user = credentials.user;
  let token = generate_token();
  let session =
    Session::new(token_digest(&token), user.user_id, state.config.session_ttl);
  state
    .store
    .create_session(session)
    .await
    .map_err(ApiError::from_store)?;
  tracing::info!(user_id = %user.user_id, "session opened");

  let cookie = session_cookie(
    &token,
    state.config.session_ttl.num_seconds(),
    state.config.secure_cookies,
  );
  Ok((
    AppendHeaders([(header::SET_COOKIE, cookie)]),
    Json(json!({ "message": "Login successful", "user": user, "token": token })),
  ))
}

// ─── Logout ──────────────────────────────────────────────────────────────────

/// `POST /auth/logout`
pub async fn logout<S>(
  State(state): State<AppState<S>>,
  headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError>
where
  S: TandemStore + Clone + Send + Sync + 'static,
{
  if let Some(token) = token_from_headers(&headers) {
    state
      .store
      .delete_session(token_digest(&token))
      .await
      .map_err(ApiError::from_store)?;
    tracing::info!("session closed");
  }

  Ok((
    AppendHeaders([(header::SET_COOKIE, cleared_cookie(state.config.secure_cookies))]),
    Json(json!({ "message": "Logged out" })),
  ))
}
