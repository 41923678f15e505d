//! SQL schema for the Tandem SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- `seq` is the insertion order and the feed's ordering key.
CREATE TABLE IF NOT EXISTS users (
    seq            INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id        TEXT NOT NULL UNIQUE,
    first_name     TEXT NOT NULL,
    last_name      TEXT,
    email          TEXT NOT NULL UNIQUE,   -- stored lowercase
    mobile_number  TEXT NOT NULL UNIQUE,   -- digits only
    gender         TEXT,
    age            INTEGER,
    photo_url      TEXT,
    password_hash  TEXT NOT NULL,          -- argon2 PHC string
    created_at     TEXT NOT NULL,
    updated_at     TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS sessions (
    token_hash  TEXT PRIMARY KEY,          -- hex SHA-256 of the bearer token
    user_id     TEXT NOT NULL REFERENCES users(user_id),
    created_at  TEXT NOT NULL,
    expires_at  TEXT NOT NULL
);

-- One row per unordered pair of users: (pair_lo, pair_hi) is the pair
-- sorted, so (A, B) and (B, A) collide on the UNIQUE constraint.
-- Rows are never deleted; status only moves interested -> accepted|rejected.
CREATE TABLE IF NOT EXISTS connections (
    request_id   TEXT PRIMARY KEY,
    sender_id    TEXT NOT NULL REFERENCES users(user_id),
    receiver_id  TEXT NOT NULL REFERENCES users(user_id),
    pair_lo      TEXT NOT NULL,
    pair_hi      TEXT NOT NULL,
    status       TEXT NOT NULL,
    created_at   TEXT NOT NULL,
    updated_at   TEXT NOT NULL,
    UNIQUE (pair_lo, pair_hi),
    CHECK  (sender_id != receiver_id),
    CHECK  (pair_lo < pair_hi),
    CHECK  (status IN ('interested', 'ignored', 'accepted', 'rejected'))
);

CREATE INDEX IF NOT EXISTS connections_sender_idx   ON connections(sender_id);
CREATE INDEX IF NOT EXISTS connections_receiver_idx ON connections(receiver_id, status);
CREATE INDEX IF NOT EXISTS sessions_user_idx        ON sessions(user_id);
CREATE INDEX IF NOT EXISTS sessions_expiry_idx      ON sessions(expires_at);

PRAGMA user_version = 1;
";
