//! Error types for `tandem-core`.

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid status: {0:?}")]
  InvalidStatus(String),

  #[error("sender and receiver cannot be the same user")]
  SelfConnection,

  #[error("a connection request already exists between these users")]
  DuplicateConnection,

  #[error("connection request not found")]
  RequestNotFound(Uuid),

  #[error("user not found: {0}")]
  UserNotFound(Uuid),

  #[error("a user with this email or mobile number already exists")]
  DuplicateUser,

  #[error("invalid input: {0}")]
  InvalidInput(String),

  #[error("invalid credentials")]
  InvalidCredentials,
}

/// The coarse class of a failure, as seen by callers of the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
  Validation,
  Conflict,
  NotFound,
  Unauthorized,
  Store,
}

/// Implemented by every error that can cross the store boundary, so higher
/// layers can map backend errors without knowing the backend.
pub trait Classify {
  fn kind(&self) -> ErrorKind;
}

impl Classify for Error {
  fn kind(&self) -> ErrorKind {
    match self {
      Self::InvalidStatus(_) | Self::SelfConnection | Self::InvalidInput(_) => {
        ErrorKind::Validation
      }
      Self::DuplicateConnection | Self::DuplicateUser => ErrorKind::Conflict,
      Self::RequestNotFound(_) | Self::UserNotFound(_) => ErrorKind::NotFound,
      Self::InvalidCredentials => ErrorKind::Unauthorized,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn ledger_errors_have_distinct_kinds() {
    assert_eq!(Error::SelfConnection.kind(), ErrorKind::Validation);
    assert_eq!(Error::InvalidStatus("x".into()).kind(), ErrorKind::Validation);
    assert_eq!(Error::DuplicateConnection.kind(), ErrorKind::Conflict);
    assert_eq!(Error::RequestNotFound(Uuid::nil()).kind(), ErrorKind::NotFound);
  }

  #[test]
  fn request_not_found_message_does_not_leak_id() {
    let id = Uuid::new_v4();
    let msg = Error::RequestNotFound(id).to_string();
    assert!(!msg.contains(&id.to_string()));
  }
}
