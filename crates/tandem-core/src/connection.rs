//! Connection requests — the ledger of directed relationship proposals.
//!
//! A record is created by its sender in an initial status and can afterwards
//! be moved exactly once, by its receiver, from `interested` to `accepted` or
//! `rejected`. Records are never deleted. At most one record exists for any
//! unordered pair of users.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, user::PublicProfile};

// ─── Status ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
  Interested,
  Ignored,
  Accepted,
  Rejected,
}

impl ConnectionStatus {
  /// The lowercase name used on the wire and in the database.
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Interested => "interested",
      Self::Ignored => "ignored",
      Self::Accepted => "accepted",
      Self::Rejected => "rejected",
    }
  }

  /// Statuses a sender may pick when creating a record.
  pub fn is_initial(&self) -> bool {
    matches!(self, Self::Interested | Self::Ignored)
  }

  /// Statuses a receiver may answer with.
  pub fn is_response(&self) -> bool {
    matches!(self, Self::Accepted | Self::Rejected)
  }

  pub fn can_transition_to(&self, next: ConnectionStatus) -> bool {
    matches!(self, Self::Interested) && next.is_response()
  }
}

impl fmt::Display for ConnectionStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for ConnectionStatus {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    match s {
      "interested" => Ok(Self::Interested),
      "ignored" => Ok(Self::Ignored),
      "accepted" => Ok(Self::Accepted),
      "rejected" => Ok(Self::Rejected),
      other => Err(Error::InvalidStatus(other.to_owned())),
    }
  }
}

// ─── Record ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionRecord {
  pub request_id:  Uuid,
  pub sender_id:   Uuid,
  pub receiver_id: Uuid,
  pub status:      ConnectionStatus,
  pub created_at:  DateTime<Utc>,
  pub updated_at:  DateTime<Utc>,
}

/// Order-independent key for two users: `PairKey::new(a, b) ==
/// PairKey::new(b, a)`. Stores keep it under a uniqueness constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PairKey {
  pub lo: Uuid,
  pub hi: Uuid,
}

impl PairKey {
  pub fn new(a: Uuid, b: Uuid) -> Self {
    if a <= b { Self { lo: a, hi: b } } else { Self { lo: b, hi: a } }
  }
}

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// Validated input to [`crate::store::TandemStore::send_request`].
#[derive(Debug, Clone)]
pub struct SendRequest {
  sender_id:   Uuid,
  receiver_id: Uuid,
  status:      ConnectionStatus,
}

impl SendRequest {
  pub fn new(
    sender_id: Uuid,
    receiver_id: Uuid,
    status: ConnectionStatus,
  ) -> Result<Self> {
    if !status.is_initial() {
      return Err(Error::InvalidStatus(status.as_str().to_owned()));
    }
    if sender_id == receiver_id {
      return Err(Error::SelfConnection);
    }
    Ok(Self { sender_id, receiver_id, status })
  }

  pub fn sender_id(&self) -> Uuid { self.sender_id }

  pub fn receiver_id(&self) -> Uuid { self.receiver_id }

  pub fn status(&self) -> ConnectionStatus { self.status }

  pub fn pair_key(&self) -> PairKey {
    PairKey::new(self.sender_id, self.receiver_id)
  }
}

/// Validated input to [`crate::store::TandemStore::respond_to_request`].
///
/// The responder is the authenticated caller; a store must only match a
/// record whose receiver is the responder and whose status is
/// [`RespondRequest::expected_status`].
#[derive(Debug, Clone)]
pub struct RespondRequest {
  request_id:   Uuid,
  responder_id: Uuid,
  status:       ConnectionStatus,
}

impl RespondRequest {
  pub fn new(
    request_id: Uuid,
    responder_id: Uuid,
    status: ConnectionStatus,
  ) -> Result<Self> {
    if !Self::expected_status().can_transition_to(status) {
      return Err(Error::InvalidStatus(status.as_str().to_owned()));
    }
    Ok(Self { request_id, responder_id, status })
  }

  /// The only status a record can be answered from.
  pub fn expected_status() -> ConnectionStatus { ConnectionStatus::Interested }

  pub fn request_id(&self) -> Uuid { self.request_id }

  pub fn responder_id(&self) -> Uuid { self.responder_id }

  pub fn status(&self) -> ConnectionStatus { self.status }
}

// ─── Listings ────────────────────────────────────────────────────────────────

/// A pending request addressed to the caller, with the sender's public
/// profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceivedRequest {
  pub request_id: Uuid,
  pub sender:     PublicProfile,
  pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
  use super::*;

  const ALL: [ConnectionStatus; 4] = [
    ConnectionStatus::Interested,
    ConnectionStatus::Ignored,
    ConnectionStatus::Accepted,
    ConnectionStatus::Rejected,
  ];

  #[test]
  fn only_interested_can_transition() {
    for from in ALL {
      for to in ALL {
        let expected = from == ConnectionStatus::Interested && to.is_response();
        assert_eq!(from.can_transition_to(to), expected, "{from} -> {to}");
      }
    }
  }

  #[test]
  fn parse_status() {
    for s in ALL {
      assert_eq!(s.as_str().parse::<ConnectionStatus>().unwrap(), s);
    }
    assert!(matches!(
      "Interested".parse::<ConnectionStatus>(),
      Err(Error::InvalidStatus(_))
    ));
    assert!(matches!(
      "pending".parse::<ConnectionStatus>(),
      Err(Error::InvalidStatus(_))
    ));
  }

  #[test]
  fn send_rejects_response_statuses() {
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
    for status in [ConnectionStatus::Accepted, ConnectionStatus::Rejected] {
      let err = SendRequest::new(a, b, status).unwrap_err();
      assert!(matches!(err, Error::InvalidStatus(_)));
    }
    assert!(SendRequest::new(a, b, ConnectionStatus::Ignored).is_ok());
  }

  #[test]
  fn send_rejects_self_connection_for_any_initial_status() {
    let a = Uuid::new_v4();
    for status in [ConnectionStatus::Interested, ConnectionStatus::Ignored] {
      let err = SendRequest::new(a, a, status).unwrap_err();
      assert!(matches!(err, Error::SelfConnection));
    }
  }

  #[test]
  fn respond_rejects_initial_statuses() {
    let (id, me) = (Uuid::new_v4(), Uuid::new_v4());
    for status in [ConnectionStatus::Interested, ConnectionStatus::Ignored] {
      let err = RespondRequest::new(id, me, status).unwrap_err();
      assert!(matches!(err, Error::InvalidStatus(_)));
    }
    assert!(RespondRequest::new(id, me, ConnectionStatus::Accepted).is_ok());
  }

  #[test]
  fn pair_key_is_order_independent() {
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
    assert_eq!(PairKey::new(a, b), PairKey::new(b, a));
    let key = PairKey::new(a, b);
    assert!(key.lo <= key.hi);
  }
}
