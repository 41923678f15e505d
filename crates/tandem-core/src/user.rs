//! Users — the identities that connection requests point at.
//!
//! Credentials are kept apart from [`User`]: a password hash only ever leaves
//! the store through [`Credentials`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Minimum accepted password length, in characters.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Fields a profile edit may never touch.
pub const RESTRICTED_FIELDS: [&str; 2] = ["email", "password"];

// ─── User ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub user_id:       Uuid,
  pub first_name:    String,
  pub last_name:     Option<String>,
  pub email:         String,
  pub mobile_number: String,
  pub gender:        Option<String>,
  pub age:           Option<u8>,
  pub photo_url:     Option<String>,
  pub created_at:    DateTime<Utc>,
  pub updated_at:    DateTime<Utc>,
}

impl User {
  pub fn public_profile(&self) -> PublicProfile {
    PublicProfile {
      user_id:    self.user_id,
      first_name: self.first_name.clone(),
      last_name:  self.last_name.clone(),
      gender:     self.gender.clone(),
      age:        self.age,
    }
  }
}

/// What other users get to see: no contact or credential fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicProfile {
  pub user_id:    Uuid,
  pub first_name: String,
  pub last_name:  Option<String>,
  pub gender:     Option<String>,
  pub age:        Option<u8>,
}

/// A user together with their stored argon2 PHC string.
#[derive(Debug, Clone)]
pub struct Credentials {
  pub user:          User,
  pub password_hash: String,
}

// ─── Signup ──────────────────────────────────────────────────────────────────

/// Input to [`crate::store::TandemStore::create_user`]. Run
/// [`NewUser::validate`] before handing it to a store.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
  pub first_name:    String,
  pub last_name:     Option<String>,
  pub email:         String,
  pub mobile_number: String,
  pub gender:        Option<String>,
  pub age:           Option<u8>,
  pub photo_url:     Option<String>,
}

impl NewUser {
  /// Check required fields and normalise email and mobile number.
  pub fn validate(mut self) -> Result<Self> {
    self.first_name = self.first_name.trim().to_owned();
    if self.first_name.is_empty() {
      return Err(Error::InvalidInput("first name is required".into()));
    }
    self.email = normalize_email(&self.email)
      .ok_or_else(|| Error::InvalidInput("email address is not valid".into()))?;
    self.mobile_number = normalize_mobile(&self.mobile_number)
      .ok_or_else(|| Error::InvalidInput("mobile number is not valid".into()))?;
    Ok(self)
  }
}

pub fn validate_password(password: &str) -> Result<()> {
  if password.chars().count() < MIN_PASSWORD_LEN {
    return Err(Error::InvalidInput(format!(
      "password must be at least {MIN_PASSWORD_LEN} characters"
    )));
  }
  Ok(())
}

fn normalize_email(raw: &str) -> Option<String> {
  let email = raw.trim().to_lowercase();
  let (local, domain) = email.split_once('@')?;
  if local.is_empty()
    || domain.is_empty()
    || domain.contains('@')
    || email.chars().any(char::is_whitespace)
  {
    return None;
  }
  Some(email)
}

fn normalize_mobile(raw: &str) -> Option<String> {
  let raw = raw.trim();
  let digits = raw.strip_prefix('+').unwrap_or(raw);
  let valid = (10..=15).contains(&digits.len())
    && digits.chars().all(|c| c.is_ascii_digit());
  valid.then(|| digits.to_owned())
}

// ─── Login ───────────────────────────────────────────────────────────────────

/// The identifier a user logs in with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginHandle {
  Email(String),
  Mobile(String),
}

impl LoginHandle {
  /// Anything that is neither an email nor a mobile number is reported as
  /// invalid credentials, so the caller learns nothing about which part of
  /// the login was wrong.
  pub fn parse(input: &str) -> Result<Self> {
    if input.contains('@') {
      normalize_email(input)
        .map(Self::Email)
        .ok_or(Error::InvalidCredentials)
    } else {
      normalize_mobile(input)
        .map(Self::Mobile)
        .ok_or(Error::InvalidCredentials)
    }
  }
}

// ─── Profile edits ───────────────────────────────────────────────────────────

/// A partial profile update. `None` leaves the stored value unchanged, and
/// an explicit JSON `null` reads as `None`, so an edit can overwrite an
/// optional field but never clear it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfilePatch {
  pub first_name: Option<String>,
  pub last_name:  Option<String>,
  pub gender:     Option<String>,
  pub age:        Option<u8>,
  pub photo_url:  Option<String>,
}

impl ProfilePatch {
  /// Parse an edit body, refusing restricted and unknown fields.
  pub fn from_json(body: serde_json::Value) -> Result<Self> {
    let object = body
      .as_object()
      .ok_or_else(|| Error::InvalidInput("expected a JSON object".into()))?;

    if let Some(field) = object
      .keys()
      .find(|k| RESTRICTED_FIELDS.contains(&k.as_str()))
    {
      return Err(Error::InvalidInput(format!("{field} cannot be edited")));
    }

    let patch: ProfilePatch = serde_json::from_value(body)
      .map_err(|e| Error::InvalidInput(e.to_string()))?;

    if patch.is_empty() {
      return Err(Error::InvalidInput("nothing to update".into()));
    }
    if let Some(first) = &patch.first_name
      && first.trim().is_empty()
    {
      return Err(Error::InvalidInput("first name cannot be blank".into()));
    }
    Ok(patch)
  }

  pub fn is_empty(&self) -> bool { *self == Self::default() }
}
