//! [`SqliteStore`] — the SQLite implementation of [`TandemStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension as _, Transaction};
use uuid::Uuid;

use tandem_core::{
  connection::{
    ConnectionRecord, ConnectionStatus, ReceivedRequest, RespondRequest,
    SendRequest,
  },
  feed::{FeedPage, PageRequest},
  session::Session,
  store::TandemStore,
  user::{Credentials, LoginHandle, NewUser, ProfilePatch, PublicProfile, User},
};

use crate::{
  Error, Result,
  encode::{
    CONNECTION_COLUMNS, PROFILE_COLUMNS, RawConnection, RawCredentials,
    RawProfile, RawReceived, RawUser, USER_COLUMNS, decode_dt, encode_dt,
    encode_status, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Closure outcomes ────────────────────────────────────────────────────────

/// Result of the insert transaction in [`SqliteStore::send_request`].
enum SendOutcome {
  Created,
  UnknownUser(Uuid),
  Duplicate,
}

fn is_unique_violation(e: &rusqlite::Error) -> bool {
  matches!(
    e,
    rusqlite::Error::SqliteFailure(err, _)
      if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
  )
}

fn user_exists(tx: &Transaction<'_>, id: &str) -> rusqlite::Result<bool> {
  Ok(
    tx.query_row(
      "SELECT 1 FROM users WHERE user_id = ?1",
      rusqlite::params![id],
      |_| Ok(true),
    )
    .optional()?
    .unwrap_or(false),
  )
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Tandem store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn fetch_user_where(
    &self,
    column: &'static str,
    value: String,
  ) -> Result<Option<RawCredentials>> {
    let sql = format!(
      "SELECT {USER_COLUMNS}, u.password_hash FROM users u WHERE u.{column} = ?1"
    );
    let raw = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(&sql, rusqlite::params![value], RawCredentials::from_row)
            .optional()?,
        )
      })
      .await?;
    Ok(raw)
  }

  #[cfg(test)]
  pub(crate) async fn session_count(&self) -> Result<i64> {
    let count = self
      .conn
      .call(|conn| {
        Ok(conn.query_row("SELECT COUNT(*) FROM sessions", [], |row| row.get(0))?)
      })
      .await?;
    Ok(count)
  }
}

// ─── TandemStore impl ────────────────────────────────────────────────────────

impl TandemStore for SqliteStore {
  type Error = Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn create_user(&self, input: NewUser, password_hash: String) -> Result<User> {
    let now = Utc::now();
    let user = User {
      user_id:       Uuid::new_v4(),
      first_name:    input.first_name,
      last_name:     input.last_name,
      email:         input.email,
      mobile_number: input.mobile_number,
      gender:        input.gender,
      age:           input.age,
      photo_url:     input.photo_url,
      created_at:    now,
      updated_at:    now,
    };

    let row = user.clone();
    let id_str = encode_uuid(user.user_id);
    let at_str = encode_dt(now);

    let inserted = self
      .conn
      .call(move |conn| {
        let result = conn.execute(
          "INSERT INTO users (
             user_id, first_name, last_name, email, mobile_number,
             gender, age, photo_url, password_hash, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
          rusqlite::params![
            id_str,
            row.first_name,
            row.last_name,
            row.email,
            row.mobile_number,
            row.gender,
            row.age,
            row.photo_url,
            password_hash,
            at_str,
          ],
        );
        match result {
          Ok(_) => Ok(true),
          Err(e) if is_unique_violation(&e) => Ok(false),
          Err(e) => Err(e.into()),
        }
      })
      .await?;

    if !inserted {
      return Err(tandem_core::Error::DuplicateUser.into());
    }
    tracing::info!(user_id = %user.user_id, "user created");
    Ok(user)
  }

  async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
    self
      .fetch_user_where("user_id", encode_uuid(id))
      .await?
      .map(|raw| raw.user.into_user())
      .transpose()
  }

  async fn find_credentials(&self, handle: &LoginHandle) -> Result<Option<Credentials>> {
    let (column, value) = match handle {
      LoginHandle::Email(email) => ("email", email.clone()),
      LoginHandle::Mobile(mobile) => ("mobile_number", mobile.clone()),
    };
    self
      .fetch_user_where(column, value)
      .await?
      .map(RawCredentials::into_credentials)
      .transpose()
  }

  async fn update_profile(&self, id: Uuid, patch: ProfilePatch) -> Result<User> {
    let id_str = encode_uuid(id);
    let at_str = encode_dt(Utc::now());

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let changed = tx.execute(
          "UPDATE users SET
             first_name = COALESCE(?2, first_name),
             last_name  = COALESCE(?3, last_name),
             gender     = COALESCE(?4, gender),
             age        = COALESCE(?5, age),
             photo_url  = COALESCE(?6, photo_url),
             updated_at = ?7
           WHERE user_id = ?1",
          rusqlite::params![
            id_str,
            patch.first_name.map(|s| s.trim().to_owned()),
            patch.last_name,
            patch.gender,
            patch.age,
            patch.photo_url,
            at_str,
          ],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        let raw = tx.query_row(
          &format!("SELECT {USER_COLUMNS} FROM users u WHERE u.user_id = ?1"),
          rusqlite::params![id_str],
          RawUser::from_row,
        )?;
        tx.commit()?;
        Ok(Some(raw))
      })
      .await?;

    raw
      .ok_or(tandem_core::Error::UserNotFound(id))?
      .into_user()
  }

  // ── Sessions ──────────────────────────────────────────────────────────────

  /// Stores `session` and drops every session that had already expired when
  /// it was created.
  async fn create_session(&self, session: Session) -> Result<()> {
    let user_str    = encode_uuid(session.user_id);
    let created_str = encode_dt(session.created_at);
    let expires_str = encode_dt(session.expires_at);

    let pruned = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let pruned = tx.execute(
          "DELETE FROM sessions WHERE expires_at <= ?1",
          rusqlite::params![created_str],
        )?;
        tx.execute(
          "INSERT INTO sessions (token_hash, user_id, created_at, expires_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![session.token_hash, user_str, created_str, expires_str],
        )?;
        tx.commit()?;
        Ok(pruned)
      })
      .await?;
    if pruned > 0 {
      tracing::debug!(pruned, "expired sessions removed");
    }
    Ok(())
  }

  async fn resolve_session(
    &self,
    token_hash: String,
    now:        DateTime<Utc>,
  ) -> Result<Option<User>> {
    let hash = token_hash.clone();
    let found: Option<(RawUser, String, String)> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {USER_COLUMNS}, s.created_at, s.expires_at
                 FROM sessions s
                 JOIN users u ON u.user_id = s.user_id
                 WHERE s.token_hash = ?1"
              ),
              rusqlite::params![hash],
              |row| Ok((RawUser::from_row(row)?, row.get(10)?, row.get(11)?)),
            )
            .optional()?,
        )
      })
      .await?;

    let Some((raw, created_at, expires_at)) = found else {
      return Ok(None);
    };
    let user = raw.into_user()?;
    let session = Session {
      token_hash,
      user_id: user.user_id,
      created_at: decode_dt(&created_at)?,
      expires_at: decode_dt(&expires_at)?,
    };
    if session.is_expired(now) {
      return Ok(None);
    }
    Ok(Some(user))
  }

  async fn delete_session(&self, token_hash: String) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "DELETE FROM sessions WHERE token_hash = ?1",
          rusqlite::params![token_hash],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Connection ledger ─────────────────────────────────────────────────────

  async fn send_request(&self, input: SendRequest) -> Result<ConnectionRecord> {
    let now = Utc::now();
    let record = ConnectionRecord {
      request_id:  Uuid::new_v4(),
      sender_id:   input.sender_id(),
      receiver_id: input.receiver_id(),
      status:      input.status(),
      created_at:  now,
      updated_at:  now,
    };

    let pair         = input.pair_key();
    let id_str       = encode_uuid(record.request_id);
    let sender       = record.sender_id;
    let receiver     = record.receiver_id;
    let sender_str   = encode_uuid(sender);
    let receiver_str = encode_uuid(receiver);
    let lo_str       = encode_uuid(pair.lo);
    let hi_str       = encode_uuid(pair.hi);
    let status_str   = encode_status(record.status);
    let at_str       = encode_dt(now);

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if !user_exists(&tx, &sender_str)? {
          return Ok(SendOutcome::UnknownUser(sender));
        }
        if !user_exists(&tx, &receiver_str)? {
          return Ok(SendOutcome::UnknownUser(receiver));
        }

        // The UNIQUE (pair_lo, pair_hi) constraint is the duplicate check;
        // it covers both directions and every status.
        let inserted = tx.execute(
          "INSERT INTO connections (
             request_id, sender_id, receiver_id, pair_lo, pair_hi,
             status, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
          rusqlite::params![
            id_str,
            sender_str,
            receiver_str,
            lo_str,
            hi_str,
            status_str,
            at_str,
          ],
        );
        match inserted {
          Ok(_) => {}
          Err(e) if is_unique_violation(&e) => return Ok(SendOutcome::Duplicate),
          Err(e) => return Err(e.into()),
        }
        tx.commit()?;
        Ok(SendOutcome::Created)
      })
      .await?;

    match outcome {
      SendOutcome::Created => {
        tracing::info!(
          request_id = %record.request_id,
          sender_id = %record.sender_id,
          receiver_id = %record.receiver_id,
          status = %record.status,
          "connection request created"
        );
        Ok(record)
      }
      SendOutcome::UnknownUser(id) => Err(tandem_core::Error::UserNotFound(id).into()),
      SendOutcome::Duplicate => Err(tandem_core::Error::DuplicateConnection.into()),
    }
  }

  async fn respond_to_request(&self, input: RespondRequest) -> Result<ConnectionRecord> {
    let request_id    = input.request_id();
    let id_str        = encode_uuid(request_id);
    let responder_str = encode_uuid(input.responder_id());
    let status_str    = encode_status(input.status());
    let pending_str   = encode_status(RespondRequest::expected_status());
    let at_str        = encode_dt(Utc::now());

    let raw: Option<RawConnection> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        // Conditional update: the WHERE clause is both the state-machine
        // guard and the receiver-only access check.
        let changed = tx.execute(
          "UPDATE connections SET status = ?1, updated_at = ?2
           WHERE request_id = ?3 AND receiver_id = ?4 AND status = ?5",
          rusqlite::params![status_str, at_str, id_str, responder_str, pending_str],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        let raw = tx.query_row(
          &format!("SELECT {CONNECTION_COLUMNS} FROM connections c WHERE c.request_id = ?1"),
          rusqlite::params![id_str],
          RawConnection::from_row,
        )?;
        tx.commit()?;
        Ok(Some(raw))
      })
      .await?;

    let record = raw
      .ok_or(tandem_core::Error::RequestNotFound(request_id))?
      .into_record()?;
    tracing::info!(
      request_id = %record.request_id,
      status = %record.status,
      "connection request answered"
    );
    Ok(record)
  }

  async fn get_request(&self, request_id: Uuid) -> Result<Option<ConnectionRecord>> {
    let id_str = encode_uuid(request_id);

    let raw: Option<RawConnection> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {CONNECTION_COLUMNS} FROM connections c WHERE c.request_id = ?1"
              ),
              rusqlite::params![id_str],
              RawConnection::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawConnection::into_record).transpose()
  }

  async fn received_requests(&self, user_id: Uuid) -> Result<Vec<ReceivedRequest>> {
    let user_str    = encode_uuid(user_id);
    let pending_str = encode_status(ConnectionStatus::Interested);

    let raws: Vec<RawReceived> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT c.request_id, c.created_at, {PROFILE_COLUMNS}
           FROM connections c
           JOIN users u ON u.user_id = c.sender_id
           WHERE c.receiver_id = ?1 AND c.status = ?2
           ORDER BY c.rowid"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![user_str, pending_str], RawReceived::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawReceived::into_received).collect()
  }

  async fn connections(&self, user_id: Uuid) -> Result<Vec<PublicProfile>> {
    let user_str     = encode_uuid(user_id);
    let accepted_str = encode_status(ConnectionStatus::Accepted);

    let raws: Vec<RawProfile> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {PROFILE_COLUMNS}
           FROM connections c
           JOIN users u ON u.user_id = CASE
             WHEN c.sender_id = ?1 THEN c.receiver_id
             ELSE c.sender_id
           END
           WHERE (c.sender_id = ?1 OR c.receiver_id = ?1) AND c.status = ?2
           ORDER BY c.rowid"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![user_str, accepted_str], RawProfile::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawProfile::into_profile).collect()
  }

  // ── Feed ──────────────────────────────────────────────────────────────────

  async fn feed(&self, requester_id: Uuid, page: PageRequest) -> Result<FeedPage> {
    let user_str   = encode_uuid(requester_id);
    let limit_val  = i64::from(page.limit());
    let offset_val = i64::try_from(page.offset()).unwrap_or(i64::MAX);

    let raws: Vec<RawProfile> = self
      .conn
      .call(move |conn| {
        // `familiar` is every counterpart of a record involving the
        // requester, whatever its status.
        let mut stmt = conn.prepare(&format!(
          "WITH familiar(user_id) AS (
             SELECT CASE WHEN c.sender_id = ?1 THEN c.receiver_id ELSE c.sender_id END
             FROM connections c
             WHERE c.sender_id = ?1 OR c.receiver_id = ?1
           )
           SELECT {PROFILE_COLUMNS}
           FROM users u
           WHERE u.user_id != ?1
             AND u.user_id NOT IN (SELECT user_id FROM familiar)
           ORDER BY u.seq
           LIMIT ?2 OFFSET ?3"
        ))?;
        let rows = stmt
          .query_map(
            rusqlite::params![user_str, limit_val, offset_val],
            RawProfile::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let data = raws
      .into_iter()
      .map(RawProfile::into_profile)
      .collect::<Result<Vec<_>>>()?;
    Ok(FeedPage::new(page, data))
  }
}
