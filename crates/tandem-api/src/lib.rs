//! JSON REST API for Tandem.
//!
//! Exposes an axum [`Router`] backed by any [`tandem_core::store::TandemStore`].
//! TLS and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = tandem_api::api_router(AppState::new(store, ApiConfig::default()));
//! ```

pub mod accounts;
pub mod auth;
pub mod error;
pub mod extract;
pub mod profile;
pub mod requests;
pub mod users;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, patch, post},
};
use chrono::Duration;
use tandem_core::store::TandemStore;

pub use error::ApiError;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Settings the handlers need at request time.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  /// How long a login session stays valid.
  pub session_ttl:    Duration,
  /// Add the `Secure` attribute to session cookies.
  pub secure_cookies: bool,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self { session_ttl: Duration::hours(24), secure_cookies: false }
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: TandemStore> {
  pub store:  Arc<S>,
  pub config: Arc<ApiConfig>,
}

impl<S: TandemStore> AppState<S> {
  pub fn new(store: S, config: ApiConfig) -> Self {
    Self { store: Arc::new(store), config: Arc::new(config) }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: AppState<S>) -> Router<()>
where
  S: TandemStore + Clone + Send + Sync + 'static,
{
  Router::new()
    // Accounts
    .route("/auth/signup", post(accounts::signup::<S>))
    .route("/auth/login", post(accounts::login::<S>))
    .route("/auth/logout", post(accounts::logout::<S>))
    // Profile
    .route("/profile", get(profile::view))
    .route("/profile/edit", patch(profile::edit::<S>))
    // Connection ledger
    .route("/request/send/{status}/{receiver_id}", post(requests::send::<S>))
    .route("/request/review/{status}/{request_id}", post(requests::review::<S>))
    // Listings
    .route("/user/requests/received", get(users::received::<S>))
    .route("/user/connections", get(users::connections::<S>))
    .route("/user/feed", get(users::feed::<S>))
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use std::collections::HashSet;

  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
  };
  use serde_json::{Value, json};
  use tandem_store_sqlite::SqliteStore;
  use tower::ServiceExt as _;

  use super::*;

  async fn make_state() -> AppState<SqliteStore> {
    let store = SqliteStore::open_in_memory().await.unwrap();
    AppState::new(store, ApiConfig::default())
  }

  async fn call(
    state:  &AppState<SqliteStore>,
    method: &str,
    uri:    &str,
    token:  Option<&str>,
    body:   Option<Value>,
  ) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
      builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let body = match body {
      Some(v) => {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
        Body::from(v.to_string())
      }
      None => Body::empty(),
    };
    api_router(state.clone())
      .oneshot(builder.body(body).unwrap())
      .await
      .unwrap()
  }

  async fn json_body(resp: Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
  }

  /// Sign up user `n` and log in; returns `(user_id, token)`.
  async fn register(state: &AppState<SqliteStore>, n: usize) -> (String, String) {
    let resp = call(
      state,
      "POST",
      "/auth/signup",
      None,
      Some(json!({
        "first_name": format!("User{n}"),
        "last_name": "Test",
        "email": format!("user{n}@example.com"),
        "mobile_number": format!("98765{n:05}"),
        "age": 25,
        "password": "hunter2hunter2",
      })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let user_id = json_body(resp).await["user"]["user_id"]
      .as_str()
      .unwrap()
      .to_string();

    let resp = call(
      state,
      "POST",
      "/auth/login",
      None,
      Some(json!({ "login": format!("user{n}@example.com"), "password": "hunter2hunter2" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let token = json_body(resp).await["token"].as_str().unwrap().to_string();
    (user_id, token)
  }

  async fn send(
    state:  &AppState<SqliteStore>,
    token:  &str,
    status: &str,
    to:     &str,
  ) -> Response {
    call(state, "POST", &format!("/request/send/{status}/{to}"), Some(token), None).await
  }

  async fn review(
    state:      &AppState<SqliteStore>,
    token:      &str,
    status:     &str,
    request_id: &str,
  ) -> Response {
    call(
      state,
      "POST",
      &format!("/request/review/{status}/{request_id}"),
      Some(token),
      None,
    )
    .await
  }

  async fn feed_ids(state: &AppState<SqliteStore>, token: &str, query: &str) -> Vec<String> {
    let resp = call(state, "GET", &format!("/user/feed{query}"), Some(token), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    json_body(resp).await["data"]
      .as_array()
      .unwrap()
      .iter()
      .map(|p| p["user_id"].as_str().unwrap().to_string())
      .collect()
  }

  // ── Accounts ────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn login_sets_http_only_cookie() {
    let state = make_state().await;
    register(&state, 1).await;

    let resp = call(
      &state,
      "POST",
      "/auth/login",
      None,
      Some(json!({ "login": "9876500001", "password": "hunter2hunter2" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let cookie = resp.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();
    assert!(cookie.starts_with("token="));
    assert!(cookie.contains("HttpOnly"));

    let body = json_body(resp).await;
    assert!(body["user"].get("password_hash").is_none());
  }

  #[tokio::test]
  async fn unknown_user_and_wrong_password_look_the_same() {
    let state = make_state().await;
    register(&state, 1).await;

    let wrong = call(
      &state,
      "POST",
      "/auth/login",
      None,
      Some(json!({ "login": "user1@example.com", "password": "nope-nope-nope" })),
    )
    .await;
    let unknown = call(
      &state,
      "POST",
      "/auth/login",
      None,
      Some(json!({ "login": "ghost@example.com", "password": "hunter2hunter2" })),
    )
    .await;

    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(wrong).await, json_body(unknown).await);
  }

  #[tokio::test]
  async fn duplicate_signup_is_rejected() {
    let state = make_state().await;
    register(&state, 1).await;

    let resp = call(
      &state,
      "POST",
      "/auth/signup",
      None,
      Some(json!({
        "first_name": "Again",
        "email": "USER1@example.com",
        "mobile_number": "9999999999",
        "password": "hunter2hunter2",
      })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(resp).await["error"], "conflict");
  }

  #[tokio::test]
  async fn malformed_bodies_are_validation_errors() {
    let state = make_state().await;

    let resp = call(
      &state,
      "POST",
      "/auth/signup",
      None,
      Some(json!({ "first_name": "A", "password": "hunter2hunter2" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = json_body(resp).await;
    assert_eq!(body["error"], "validation");
    assert!(body["message"].as_str().unwrap().contains("email"));

    for (content_type, payload) in [
      ("application/json", "{not json"),
      ("text/plain", r#"{"login":"a@b.co","password":"x"}"#),
    ] {
      let req = Request::builder()
        .method("POST")
        .uri("/auth/login")
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(payload))
        .unwrap();
      let resp = api_router(state.clone()).oneshot(req).await.unwrap();
      assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{content_type}");
      assert_eq!(json_body(resp).await["error"], "validation");
    }
  }

  #[tokio::test]
  async fn malformed_query_is_a_validation_error() {
    let state = make_state().await;
    let (_, token) = register(&state, 1).await;

    let resp = call(&state, "GET", "/user/feed?page=1&page=2", Some(&token), None).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(resp).await["error"], "validation");
  }

  #[tokio::test]
  async fn profile_matches_signup_response() {
    let state = make_state().await;
    let resp = call(
      &state,
      "POST",
      "/auth/signup",
      None,
      Some(json!({
        "first_name": "Ada",
        "email": "ada@example.com",
        "mobile_number": "9876500001",
        "password": "hunter2hunter2",
      })),
    )
    .await;
    let created = json_body(resp).await["user"].clone();

    let resp = call(
      &state,
      "POST",
      "/auth/login",
      None,
      Some(json!({ "login": "ada@example.com", "password": "hunter2hunter2" })),
    )
    .await;
    let token = json_body(resp).await["token"].as_str().unwrap().to_string();

    let resp = call(&state, "GET", "/profile", Some(&token), None).await;
    assert_eq!(json_body(resp).await, created);
  }

  #[tokio::test]
  async fn protected_routes_require_a_session() {
    let state = make_state().await;
    for (method, uri) in [
      ("GET", "/profile"),
      ("GET", "/user/feed"),
      ("GET", "/user/connections"),
      ("GET", "/user/requests/received"),
    ] {
      let resp = call(&state, method, uri, None, None).await;
      assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{uri}");
    }
    let resp = call(&state, "GET", "/profile", Some("bogus"), None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  }

  #[tokio::test]
  async fn logout_ends_the_session() {
    let state = make_state().await;
    let (_, token) = register(&state, 1).await;

    assert_eq!(call(&state, "GET", "/profile", Some(&token), None).await.status(), StatusCode::OK);

    let resp = call(&state, "POST", "/auth/logout", Some(&token), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let cookie = resp.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();
    assert!(cookie.contains("Max-Age=0"));

    let resp = call(&state, "GET", "/profile", Some(&token), None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  }

  // ── Profile ─────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn profile_edit_refuses_email_and_password() {
    let state = make_state().await;
    let (_, token) = register(&state, 1).await;

    for body in [json!({ "email": "new@example.com" }), json!({ "password": "x" })] {
      let resp = call(&state, "PATCH", "/profile/edit", Some(&token), Some(body)).await;
      assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    let resp = call(
      &state,
      "PATCH",
      "/profile/edit",
      Some(&token),
      Some(json!({ "age": 31, "gender": "female" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["user"]["age"], 31);
    assert_eq!(body["user"]["email"], "user1@example.com");
  }

  // ── Ledger ──────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn send_validations() {
    let state = make_state().await;
    let (u1, t1) = register(&state, 1).await;
    let (u2, _) = register(&state, 2).await;

    for status in ["interested", "ignored"] {
      let resp = send(&state, &t1, status, &u1).await;
      assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
      assert_eq!(json_body(resp).await["error"], "validation");
    }
    for status in ["accepted", "rejected", "bogus"] {
      let resp = send(&state, &t1, status, &u2).await;
      assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{status}");
    }
    let resp = send(&state, &t1, "interested", "not-a-uuid").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = send(&state, &t1, "interested", &uuid::Uuid::new_v4().to_string()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn third_party_cannot_review() {
    let state = make_state().await;
    let (_, t1) = register(&state, 1).await;
    let (u2, t2) = register(&state, 2).await;
    let (_, t3) = register(&state, 3).await;

    let resp = send(&state, &t1, "interested", &u2).await;
    let request_id = json_body(resp).await["data"]["request_id"]
      .as_str()
      .unwrap()
      .to_string();

    for token in [&t3, &t1] {
      let resp = review(&state, token, "accepted", &request_id).await;
      assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    let resp = review(&state, &t2, "interested", &request_id).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = review(&state, &t2, "rejected", &request_id).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await["data"]["status"], "rejected");

    let resp = review(&state, &t2, "accepted", &request_id).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = review(&state, &t2, "accepted", "not-a-uuid").await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn five_user_scenario() {
    let state = make_state().await;
    let mut users = Vec::new();
    for n in 1..=5 {
      users.push(register(&state, n).await);
    }
    let (u1, t1) = &users[0];
    let (u2, t2) = &users[1];
    let (u3, t3) = &users[2];

    let resp = send(&state, t1, "interested", u2).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let request_id = json_body(resp).await["data"]["request_id"]
      .as_str()
      .unwrap()
      .to_string();

    let resp = send(&state, t1, "interested", u2).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(resp).await["error"], "conflict");

    let resp = send(&state, t2, "ignored", u1).await;
    assert_eq!(json_body(resp).await["error"], "conflict");

    let received = call(&state, "GET", "/user/requests/received", Some(t2), None).await;
    let received = json_body(received).await;
    assert_eq!(received["data"][0]["request_id"], request_id.as_str());
    assert_eq!(received["data"][0]["sender"]["user_id"], u1.as_str());
    assert!(received["data"][0]["sender"].get("email").is_none());

    let resp = review(&state, t2, "accepted", &request_id).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let connections = call(&state, "GET", "/user/connections", Some(t1), None).await;
    assert_eq!(json_body(connections).await["data"][0]["user_id"], u2.as_str());

    let resp = call(&state, "GET", "/user/feed?page=1&limit=10", Some(t3), None).await;
    let body = json_body(resp).await;
    assert_eq!(body["page"], 1);
    assert_eq!(body["limit"], 10);
    let ids: HashSet<&str> = body["data"]
      .as_array()
      .unwrap()
      .iter()
      .map(|p| p["user_id"].as_str().unwrap())
      .collect();
    assert!(!ids.contains(u3.as_str()));
    assert!(ids.contains(users[3].0.as_str()));
    assert!(ids.contains(users[4].0.as_str()));

    let u1_feed = feed_ids(&state, t1, "").await;
    assert!(!u1_feed.contains(u1) && !u1_feed.contains(u2));
    assert_eq!(u1_feed.len(), 3);
  }

  #[tokio::test]
  async fn feed_defaults_and_pagination() {
    let state = make_state().await;
    let mut users = Vec::new();
    for n in 1..=7 {
      users.push(register(&state, n).await);
    }
    let token = &users[0].1;

    let resp = call(&state, "GET", "/user/feed?page=zero&limit=-4", Some(token), None).await;
    let body = json_body(resp).await;
    assert_eq!((body["page"].as_u64(), body["limit"].as_u64()), (Some(1), Some(10)));
    assert_eq!(body["data"].as_array().unwrap().len(), 6);

    let mut paged = Vec::new();
    for page in 1..=3 {
      paged.extend(feed_ids(&state, token, &format!("?page={page}&limit=2")).await);
    }
    assert_eq!(paged, feed_ids(&state, token, "?page=1&limit=6").await);

    assert!(feed_ids(&state, token, "?page=9&limit=2").await.is_empty());
  }
}
