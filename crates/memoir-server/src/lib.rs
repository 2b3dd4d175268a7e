//! HTTP triggers and bootstrap pieces for memoir.
//!
//! Exposes an axum [`Router`] with the on-demand `POST /sync` and
//! `POST /dedupe` triggers, plus the scheduled-sync loop the binary starts
//! next to it.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod schedule;

pub use config::{ServerConfig, SyncConfig};
pub use error::Error;

use std::sync::Arc;

use axum::{Router, routing::post};
use memoir_core::{
  feed::FeedSource,
  store::{BlobStore, EventStore},
};
use memoir_sync::Engine;
use tower_http::trace::TraceLayer;

use auth::AuthConfig;

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S, B, F> {
  pub engine: Engine<S, B, F>,
  pub sync:   Arc<SyncConfig>,
  pub auth:   Arc<AuthConfig>,
}

impl<S, B, F> Clone for AppState<S, B, F> {
  fn clone(&self) -> Self {
    Self {
      engine: self.engine.clone(),
      sync:   Arc::clone(&self.sync),
      auth:   Arc::clone(&self.auth),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the trigger [`Router`].
pub fn router<S, B, F>(state: AppState<S, B, F>) -> Router
where
  S: EventStore + 'static,
  B: BlobStore + 'static,
  F: FeedSource + 'static,
{
  Router::new()
    .route("/sync", post(handlers::sync::<S, B, F>))
    .route("/dedupe", post(handlers::dedupe::<S, B, F>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
  };
  use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
  use memoir_feed::{FeedClient, FeedConfig};
  use memoir_store_sqlite::SqliteStore;
  use memoir_sync::SyncSettings;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;
  use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
  };

  use super::*;

  type TestState = AppState<SqliteStore, SqliteStore, FeedClient>;

  async fn make_state(feed: &MockServer) -> TestState {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let client = FeedClient::new(FeedConfig {
      base_url:      format!("{}/page-1", feed.uri()),
      access_token:  "token".into(),
      max_page_size: 100,
      timeout_secs:  5,
    })
    .unwrap();

    let engine = Engine::new(
      Arc::clone(&store),
      store,
      Arc::new(client),
      SyncSettings {
        public_base_url: "https://memoir.example.com".into(),
        ..Default::default()
      },
    );

    AppState {
      engine,
      sync: Arc::new(SyncConfig::default()),
      auth: Arc::new(AuthConfig {
        username:      "admin".into(),
        password_hash: auth::hash_password("secret").unwrap(),
      }),
    }
  }

  fn auth_header(user: &str, pass: &str) -> String {
    format!("Basic {}", B64.encode(format!("{user}:{pass}")))
  }

  async fn post_json(state: TestState, uri: &str, auth: Option<&str>, body: &str) -> Response {
    let mut req = Request::builder().method("POST").uri(uri);
    if let Some(auth) = auth {
      req = req.header(header::AUTHORIZATION, auth);
    }
    if !body.is_empty() {
      req = req.header(header::CONTENT_TYPE, "application/json");
    }
    router(state)
      .oneshot(req.body(Body::from(body.to_owned())).unwrap())
      .await
      .unwrap()
  }

  async fn json_body(resp: Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
      .await
      .unwrap();
    serde_json::from_slice(&bytes).unwrap()
  }

  async fn mount_feed(server: &MockServer) {
    Mock::given(method("GET"))
      .and(path("/page-1"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "name": "Page Owner" })))
      .mount(server)
      .await;
    Mock::given(method("GET"))
      .and(path("/page-1/feed"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "data": [
          { "id": "1_1", "message": "First post" },
          { "id": "1_2", "story": "Ada updated her status." },
          { "id": "1_3" }
        ]
      })))
      .mount(server)
      .await;
  }

  #[tokio::test]
  async fn unauthenticated_requests_return_401() {
    let server = MockServer::start().await;
    let state = make_state(&server).await;

    let resp = post_json(state.clone(), "/sync", None, "").await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(resp.headers().contains_key(header::WWW_AUTHENTICATE));

    let wrong = auth_header("admin", "nope");
    let resp = post_json(state, "/dedupe", Some(&wrong), "").await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  }

  #[tokio::test]
  async fn sync_returns_batch_summary() {
    let server = MockServer::start().await;
    mount_feed(&server).await;
    let state = make_state(&server).await;
    let auth = auth_header("admin", "secret");

    let resp = post_json(state.clone(), "/sync", Some(&auth), r#"{"target_count": 10}"#).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let summary = json_body(resp).await;
    assert_eq!(summary["processed"], 2);
    assert_eq!(summary["inserted"], 2);
    assert_eq!(summary["has_more"], false);

    // Empty body falls back to configured defaults; the second run updates.
    let resp = post_json(state, "/sync", Some(&auth), "").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let summary = json_body(resp).await;
    assert_eq!(summary["inserted"], 0);
    assert_eq!(summary["updated"], 2);
  }

  #[tokio::test]
  async fn malformed_sync_body_is_a_bad_request() {
    let server = MockServer::start().await;
    let state = make_state(&server).await;
    let auth = auth_header("admin", "secret");

    let resp = post_json(state, "/sync", Some(&auth), r#"{"target": "many"}"#).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn feed_failure_maps_to_bad_gateway() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/page-1/feed"))
      .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
      .mount(&server)
      .await;
    let state = make_state(&server).await;
    let auth = auth_header("admin", "secret");

    let resp = post_json(state, "/sync", Some(&auth), "").await;
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    let body = json_body(resp).await;
    assert!(body["error"].as_str().unwrap().contains("feed unavailable"));
  }

  #[tokio::test]
  async fn dedupe_returns_counts() {
    let server = MockServer::start().await;
    let state = make_state(&server).await;
    let auth = auth_header("admin", "secret");

    let resp = post_json(state, "/dedupe", Some(&auth), "").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
      json_body(resp).await,
      json!({ "events_removed": 0, "photos_removed": 0 })
    );
  }

  #[tokio::test]
  async fn scheduled_sync_runs_immediately() {
    let server = MockServer::start().await;
    mount_feed(&server).await;
    let state = make_state(&server).await;

    let handle = schedule::spawn_scheduled_sync(
      state.engine.clone(),
      state.sync.request(None, true),
      std::time::Duration::from_secs(3600),
    );

    let requests = || async { server.received_requests().await.unwrap_or_default().len() };
    for _ in 0..100 {
      if requests().await >= 2 {
        break;
      }
      tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    handle.abort();
    assert!(requests().await >= 2);
  }
}
