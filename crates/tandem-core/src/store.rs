//! The `TandemStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `tandem-store-sqlite`).
//! Higher layers (`tandem-api`, `tandem-server`) depend on this abstraction,
//! not on any concrete backend.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  Classify,
  connection::{ConnectionRecord, ReceivedRequest, RespondRequest, SendRequest},
  feed::{FeedPage, PageRequest},
  session::Session,
  user::{Credentials, LoginHandle, NewUser, ProfilePatch, PublicProfile, User},
};

/// Abstraction over a Tandem store backend.
///
/// Ledger writes must be atomic: two concurrent `send_request` calls for the
/// same pair of users (in either direction) cannot both succeed, and two
/// concurrent `respond_to_request` calls cannot both transition the same
/// record.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait TandemStore: Send + Sync {
  type Error: std::error::Error + Classify + Send + Sync + 'static;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Persist a validated signup. Fails with a conflict if the email or
  /// mobile number is already registered.
  fn create_user(
    &self,
    input: NewUser,
    password_hash: String,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  /// Retrieve a user by id. Returns `None` if not found.
  fn get_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// Look up a user and their password hash by login handle.
  fn find_credentials<'a>(
    &'a self,
    handle: &'a LoginHandle,
  ) -> impl Future<Output = Result<Option<Credentials>, Self::Error>> + Send + 'a;

  /// Apply a partial profile update and return the updated user.
  fn update_profile(
    &self,
    id: Uuid,
    patch: ProfilePatch,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  // ── Sessions ──────────────────────────────────────────────────────────

  fn create_session(
    &self,
    session: Session,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Resolve a token digest to its user. Unknown and expired sessions
  /// resolve to `None`.
  fn resolve_session(
    &self,
    token_hash: String,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// Remove a session. Removing an unknown session is not an error.
  fn delete_session(
    &self,
    token_hash: String,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Connection ledger ─────────────────────────────────────────────────

  /// Create a connection record in the requested initial status.
  ///
  /// Fails if the receiver does not exist or if any record already exists
  /// for the unordered pair, whatever its direction or status.
  fn send_request(
    &self,
    input: SendRequest,
  ) -> impl Future<Output = Result<ConnectionRecord, Self::Error>> + Send + '_;

  /// Move an `interested` record addressed to the responder into the
  /// requested response status.
  ///
  /// A missing record, a record addressed to someone else, and a record that
  /// is no longer `interested` all fail the same way.
  fn respond_to_request(
    &self,
    input: RespondRequest,
  ) -> impl Future<Output = Result<ConnectionRecord, Self::Error>> + Send + '_;

  /// Retrieve a record by id, regardless of who is asking.
  fn get_request(
    &self,
    request_id: Uuid,
  ) -> impl Future<Output = Result<Option<ConnectionRecord>, Self::Error>> + Send + '_;

  /// Pending (`interested`) requests addressed to `user_id`, oldest first.
  fn received_requests(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Vec<ReceivedRequest>, Self::Error>> + Send + '_;

  /// Counterparts of every `accepted` record involving `user_id`.
  fn connections(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Vec<PublicProfile>, Self::Error>> + Send + '_;

  // ── Feed ──────────────────────────────────────────────────────────────

  /// One page of users that `requester_id` has no record with, excluding
  /// the requester, in user creation order.
  fn feed(
    &self,
    requester_id: Uuid,
    page: PageRequest,
  ) -> impl Future<Output = Result<FeedPage, Self::Error>> + Send + '_;
}
