//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (nanoseconds, `Z`
//! suffix) so that lexical order matches chronological order. UUIDs are
//! stored as hyphenated lowercase strings.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Row;
use tandem_core::{
  connection::{ConnectionRecord, ConnectionStatus, ReceivedRequest},
  user::{Credentials, PublicProfile, User},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── ConnectionStatus ────────────────────────────────────────────────────────

pub fn encode_status(s: ConnectionStatus) -> &'static str { s.as_str() }

pub fn decode_status(s: &str) -> Result<ConnectionStatus> {
  s.parse()
    .map_err(|_| Error::Decode(format!("unknown connection status: {s:?}")))
}

// ─── Column lists ────────────────────────────────────────────────────────────

/// Columns read by [`RawUser::from_row`], in order, for a `users` row
/// aliased as `u`.
pub const USER_COLUMNS: &str = "u.user_id, u.first_name, u.last_name, u.email, \
  u.mobile_number, u.gender, u.age, u.photo_url, u.created_at, u.updated_at";

/// Columns read by [`RawProfile::from_row`], in order.
pub const PROFILE_COLUMNS: &str =
  "u.user_id, u.first_name, u.last_name, u.gender, u.age";

/// Columns read by [`RawConnection::from_row`], in order, for a
/// `connections` row aliased as `c`.
pub const CONNECTION_COLUMNS: &str = "c.request_id, c.sender_id, \
  c.receiver_id, c.status, c.created_at, c.updated_at";

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `users` row.
pub struct RawUser {
  pub user_id:       String,
  pub first_name:    String,
  pub last_name:     Option<String>,
  pub email:         String,
  pub mobile_number: String,
  pub gender:        Option<String>,
  pub age:           Option<u8>,
  pub photo_url:     Option<String>,
  pub created_at:    String,
  pub updated_at:    String,
}

impl RawUser {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:       row.get(0)?,
      first_name:    row.get(1)?,
      last_name:     row.get(2)?,
      email:         row.get(3)?,
      mobile_number: row.get(4)?,
      gender:        row.get(5)?,
      age:           row.get(6)?,
      photo_url:     row.get(7)?,
      created_at:    row.get(8)?,
      updated_at:    row.get(9)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:       decode_uuid(&self.user_id)?,
      first_name:    self.first_name,
      last_name:     self.last_name,
      email:         self.email,
      mobile_number: self.mobile_number,
      gender:        self.gender,
      age:           self.age,
      photo_url:     self.photo_url,
      created_at:    decode_dt(&self.created_at)?,
      updated_at:    decode_dt(&self.updated_at)?,
    })
  }
}

/// A `users` row plus the trailing `password_hash` column.
pub struct RawCredentials {
  pub user:          RawUser,
  pub password_hash: String,
}

impl RawCredentials {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self { user: RawUser::from_row(row)?, password_hash: row.get(10)? })
  }

  pub fn into_credentials(self) -> Result<Credentials> {
    Ok(Credentials {
      user:          self.user.into_user()?,
      password_hash: self.password_hash,
    })
  }
}

/// The public projection of a `users` row.
pub struct RawProfile {
  pub user_id:    String,
  pub first_name: String,
  pub last_name:  Option<String>,
  pub gender:     Option<String>,
  pub age:        Option<u8>,
}

impl RawProfile {
  /// Read the five profile columns starting at column `at`.
  pub fn from_row_at(row: &Row<'_>, at: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:    row.get(at)?,
      first_name: row.get(at + 1)?,
      last_name:  row.get(at + 2)?,
      gender:     row.get(at + 3)?,
      age:        row.get(at + 4)?,
    })
  }

  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Self::from_row_at(row, 0)
  }

  pub fn into_profile(self) -> Result<PublicProfile> {
    Ok(PublicProfile {
      user_id:    decode_uuid(&self.user_id)?,
      first_name: self.first_name,
      last_name:  self.last_name,
      gender:     self.gender,
      age:        self.age,
    })
  }
}

/// Raw strings read directly from a `connections` row.
pub struct RawConnection {
  pub request_id:  String,
  pub sender_id:   String,
  pub receiver_id: String,
  pub status:      String,
  pub created_at:  String,
  pub updated_at:  String,
}

impl RawConnection {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      request_id:  row.get(0)?,
      sender_id:   row.get(1)?,
      receiver_id: row.get(2)?,
      status:      row.get(3)?,
      created_at:  row.get(4)?,
      updated_at:  row.get(5)?,
    })
  }

  pub fn into_record(self) -> Result<ConnectionRecord> {
    Ok(ConnectionRecord {
      request_id:  decode_uuid(&self.request_id)?,
      sender_id:   decode_uuid(&self.sender_id)?,
      receiver_id: decode_uuid(&self.receiver_id)?,
      status:      decode_status(&self.status)?,
      created_at:  decode_dt(&self.created_at)?,
      updated_at:  decode_dt(&self.updated_at)?,
    })
  }
}

/// A pending request joined with its sender's profile.
pub struct RawReceived {
  pub request_id: String,
  pub created_at: String,
  pub sender:     RawProfile,
}

impl RawReceived {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      request_id: row.get(0)?,
      created_at: row.get(1)?,
      sender:     RawProfile::from_row_at(row, 2)?,
    })
  }

  pub fn into_received(self) -> Result<ReceivedRequest> {
    Ok(ReceivedRequest {
      request_id: decode_uuid(&self.request_id)?,
      created_at: decode_dt(&self.created_at)?,
      sender:     self.sender.into_profile()?,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn timestamps_are_fixed_width_and_sortable() {
    let a = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    let b = Utc.timestamp_opt(1_700_000_000, 500_000_000).unwrap();
    let (ea, eb) = (encode_dt(a), encode_dt(b));
    assert_eq!(ea.len(), eb.len());
    assert!(ea < eb);
    assert_eq!(decode_dt(&eb).unwrap(), b);
  }

  #[test]
  fn timestamps_keep_full_precision() {
    let now = Utc::now();
    assert_eq!(decode_dt(&encode_dt(now)).unwrap(), now);

    let odd = Utc.timestamp_opt(1_700_000_000, 585_935_967).unwrap();
    assert_eq!(encode_dt(odd), "2023-11-14T22:13:20.585935967Z");
    assert_eq!(decode_dt(&encode_dt(odd)).unwrap(), odd);
  }

  #[test]
  fn unknown_status_is_a_decode_error() {
    assert!(matches!(decode_status("pending"), Err(Error::Decode(_))));
    assert_eq!(
      decode_status("accepted").unwrap(),
      ConnectionStatus::Accepted
    );
  }
}
