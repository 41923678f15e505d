//! Login sessions.
//!
//! Clients hold an opaque bearer token; stores only ever see its SHA-256
//! digest, so a leaked database does not leak usable tokens.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
  /// Lowercase hex SHA-256 of the bearer token.
  pub token_hash: String,
  pub user_id:    Uuid,
  pub created_at: DateTime<Utc>,
  pub expires_at: DateTime<Utc>,
}

impl Session {
  pub fn new(token_hash: String, user_id: Uuid, ttl: Duration) -> Self {
    let created_at = Utc::now();
    Self { token_hash, user_id, created_at, expires_at: created_at + ttl }
  }

  pub fn is_expired(&self, now: DateTime<Utc>) -> bool { now >= self.expires_at }
}
