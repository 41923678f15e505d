//! Authentication gate: password hashing, session tokens and the
//! [`CurrentUser`] extractor.
//!
//! A session token is 32 random bytes, base64url-encoded, handed to the
//! client once. The store only ever sees its SHA-256 digest.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::SaltString,
};
use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD as B64};
use rand_core::{OsRng, RngCore};
use sha2::{Digest, Sha256};
use tandem_core::{store::TandemStore, user::User};

use crate::{AppState, error::ApiError};

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "token";

const TOKEN_BYTES: usize = 32;

// ─── Passwords ───────────────────────────────────────────────────────────────

/// Hash a password into an argon2 PHC string.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|hash| hash.to_string())
    .map_err(|e| ApiError::Store(format!("argon2 error: {e}").into()))
}

/// Check a password against a stored PHC string. A malformed hash never
/// verifies.
pub fn verify_password(password: &str, phc: &str) -> bool {
  PasswordHash::new(phc)
    .map(|parsed| {
      Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
    })
    .unwrap_or(false)
}

// ─── Tokens ──────────────────────────────────────────────────────────────────

pub fn generate_token() -> String {
  let mut bytes = [0u8; TOKEN_BYTES];
  OsRng.fill_bytes(&mut bytes);
  B64.encode(bytes)
}

/// The digest under which a token's session is stored.
pub fn token_digest(token: &str) -> String {
  hex::encode(Sha256::digest(token.as_bytes()))
}

/// Find the session token in the `token` cookie or, failing that, in an
/// `Authorization: Bearer` header.
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
  let from_cookie = headers
    .get_all(header::COOKIE)
    .iter()
    .filter_map(|v| v.to_str().ok())
    .flat_map(|v| v.split(';'))
    .filter_map(|pair| pair.trim().split_once('='))
    .find(|(name, _)| *name == SESSION_COOKIE)
    .map(|(_, value)| value.to_string());

  from_cookie.filter(|t| !t.is_empty()).or_else(|| {
    headers
      .get(header::AUTHORIZATION)
      .and_then(|v| v.to_str().ok())
      .and_then(|v| v.strip_prefix("Bearer "))
      .map(|t| t.trim().to_string())
      .filter(|t| !t.is_empty())
  })
}

// ─── Cookies ─────────────────────────────────────────────────────────────────

pub fn session_cookie(token: &str, max_age_secs: i64, secure: bool) -> String {
  let mut cookie = format!(
    "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Strict; Max-Age={max_age_secs}"
  );
  if secure {
    cookie.push_str("; Secure");
  }
  cookie
}

/// A cookie that overwrites and expires the session cookie. Attributes match
/// [`session_cookie`] so browsers treat it as the same cookie.
pub fn cleared_cookie(secure: bool) -> String { session_cookie("", 0, secure) }

// ─── Extractor ───────────────────────────────────────────────────────────────

/// The authenticated caller. Present in a handler means the request carried a
/// live session.
pub struct CurrentUser(pub User);

impl<S> FromRequestParts<AppState<S>> for CurrentUser
where
  S: TandemStore + Clone + Send + Sync + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let token = token_from_headers(&parts.headers)
      .ok_or_else(|| ApiError::Unauthorized("authentication required".into()))?;

    let user = state
      .store
      .resolve_session(token_digest(&token), chrono::Utc::now())
      .await
      .map_err(ApiError::from_store)?
      .ok_or_else(|| ApiError::Unauthorized("session is invalid or expired".into()))?;

    Ok(CurrentUser(user))
  }
}
