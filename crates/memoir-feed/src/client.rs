//! [`FeedClient`], the reqwest implementation of [`FeedSource`].

use std::time::Duration;

use memoir_core::{
  blob::{Blob, DEFAULT_CONTENT_TYPE},
  feed::FeedSource,
  post::{AuthorProfile, FeedPage},
};
use reqwest::{Client, Response, header};
use serde::Deserialize;
use tracing::debug;

use crate::{
  Error, Result,
  wire::{PageEnvelope, ProfileEnvelope},
};

/// Explicit field selection for feed posts. Anything not listed here is
/// absent from the response.
pub const POST_FIELDS: &str = "id,message,story,created_time,updated_time,\
  from{name,picture},place{name},status_type,\
  attachments{type,title,description,url,media,subattachments},\
  full_picture,permalink_url";

const PROFILE_FIELDS: &str = "name,picture,location";

// ─── Configuration ────────────────────────────────────────────────────────────

/// Connection settings for the feed API.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
  /// Node the feed hangs off, e.g. `https://graph.example.com/v19.0/<page-id>`.
  pub base_url:      String,
  pub access_token:  String,
  /// Upstream maximum for `limit`; requests are clamped to it.
  #[serde(default = "default_max_page_size")]
  pub max_page_size: u32,
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs:  u64,
}

fn default_max_page_size() -> u32 { 100 }

fn default_timeout_secs() -> u64 { 30 }

// ─── Client ───────────────────────────────────────────────────────────────────

/// Async HTTP client for the feed API.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct FeedClient {
  client: Client,
  config: FeedConfig,
}

impl FeedClient {
  pub fn new(config: FeedConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
  }

  fn clamp_limit(&self, limit: u32) -> u32 { limit.clamp(1, self.config.max_page_size.max(1)) }
}

/// Turn a non-success feed response into [`Error::FeedUnavailable`].
async fn ensure_success(resp: Response) -> Result<Response> {
  let status = resp.status();
  if status.is_success() {
    return Ok(resp);
  }
  let body = resp.text().await.unwrap_or_default();
  Err(Error::FeedUnavailable { status: status.as_u16(), body })
}

// ─── FeedSource impl ──────────────────────────────────────────────────────────

impl FeedSource for FeedClient {
  type Error = Error;

  /// `GET {base}/feed?fields=…&limit=N[&after=CURSOR]`
  async fn fetch_page(&self, cursor: Option<String>, limit: u32) -> Result<FeedPage> {
    let limit = self.clamp_limit(limit).to_string();

    let mut req = self
      .client
      .get(self.url("/feed"))
      .bearer_auth(&self.config.access_token)
      .query(&[("fields", POST_FIELDS), ("limit", limit.as_str())]);
    if let Some(after) = cursor.as_deref() {
      req = req.query(&[("after", after)]);
    }

    let resp = ensure_success(req.send().await?).await?;
    let page = resp.json::<PageEnvelope>().await?.into_page();

    debug!(
      posts = page.posts.len(),
      has_next = page.next_cursor.is_some(),
      "fetched feed page"
    );
    Ok(page)
  }

  /// `GET {base}?fields=name,picture,location`
  async fn fetch_profile(&self) -> Result<AuthorProfile> {
    let resp = self
      .client
      .get(self.url(""))
      .bearer_auth(&self.config.access_token)
      .query(&[("fields", PROFILE_FIELDS)])
      .send()
      .await?;

    let resp = ensure_success(resp).await?;
    Ok(resp.json::<ProfileEnvelope>().await?.into_profile())
  }

  /// Plain `GET` of a CDN URL; no credentials are attached.
  async fn fetch_media(&self, url: &str) -> Result<Blob> {
    let resp = self.client.get(url).send().await?;

    let status = resp.status();
    if !status.is_success() {
      return Err(Error::MediaUnavailable { url: url.to_owned(), status: status.as_u16() });
    }

    let content_type = resp
      .headers()
      .get(header::CONTENT_TYPE)
      .and_then(|v| v.to_str().ok())
      .unwrap_or(DEFAULT_CONTENT_TYPE)
      .to_owned();
    let bytes = resp.bytes().await?;

    debug!(%url, size = bytes.len(), %content_type, "downloaded media");
    Ok(Blob::new(bytes, content_type))
  }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use serde_json::json;
  use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{header, method, path, query_param, query_param_is_missing},
  };

  use super::*;

  fn client(server: &MockServer) -> FeedClient {
    FeedClient::new(FeedConfig {
      base_url:      format!("{}/v19.0/page-1/", server.uri()),
      access_token:  "secret-token".into(),
      max_page_size: 50,
      timeout_secs:  5,
    })
    .unwrap()
  }

  #[tokio::test]
  async fn first_page_sends_fields_and_reads_cursor() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/v19.0/page-1/feed"))
      .and(query_param("fields", POST_FIELDS))
      .and(query_param("limit", "10"))
      .and(query_param_is_missing("after"))
      .and(header("authorization", "Bearer secret-token"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "data": [
          { "id": "1_1", "message": "hello" },
          { "id": "1_2", "story": "Ada updated her cover photo." }
        ],
        "paging": {
          "cursors": { "before": "b", "after": "CURSOR_2" },
          "next": "https://graph.example.com/next"
        }
      })))
      .expect(1)
      .mount(&server)
      .await;

    let page = client(&server).fetch_page(None, 10).await.unwrap();
    assert_eq!(page.posts.len(), 2);
    assert_eq!(page.posts[0].message.as_deref(), Some("hello"));
    assert_eq!(page.next_cursor.as_deref(), Some("CURSOR_2"));
  }

  #[tokio::test]
  async fn cursor_is_forwarded_and_limit_clamped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/v19.0/page-1/feed"))
      .and(query_param("after", "CURSOR_2"))
      .and(query_param("limit", "50"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
      .expect(1)
      .mount(&server)
      .await;

    let page = client(&server)
      .fetch_page(Some("CURSOR_2".into()), 500)
      .await
      .unwrap();
    assert!(page.posts.is_empty());
    assert!(page.next_cursor.is_none());
  }

  #[tokio::test]
  async fn last_page_cursor_without_next_is_dropped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/v19.0/page-1/feed"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "data": [ { "id": "1_9", "message": "last" } ],
        "paging": { "cursors": { "after": "STALE" } }
      })))
      .mount(&server)
      .await;

    let page = client(&server).fetch_page(None, 25).await.unwrap();
    assert_eq!(page.posts.len(), 1);
    assert!(page.next_cursor.is_none());
  }

  #[tokio::test]
  async fn non_success_is_feed_unavailable_with_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/v19.0/page-1/feed"))
      .respond_with(
        ResponseTemplate::new(400).set_body_string(r#"{"error":{"message":"bad token"}}"#),
      )
      .mount(&server)
      .await;

    let err = client(&server).fetch_page(None, 25).await.unwrap_err();
    match err {
      Error::FeedUnavailable { status, body } => {
        assert_eq!(status, 400);
        assert!(body.contains("bad token"));
      }
      other => panic!("unexpected error: {other:?}"),
    }
  }

  #[tokio::test]
  async fn profile_flattens_picture_and_location() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/v19.0/page-1"))
      .and(query_param("fields", "name,picture,location"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "name": "Ada Lovelace",
        "picture": { "data": { "url": "https://cdn.example.com/ada.jpg" } },
        "location": { "city": "London", "country": "United Kingdom" }
      })))
      .mount(&server)
      .await;

    let profile = client(&server).fetch_profile().await.unwrap();
    assert_eq!(profile.name.as_deref(), Some("Ada Lovelace"));
    assert_eq!(profile.picture.as_deref(), Some("https://cdn.example.com/ada.jpg"));
    assert_eq!(profile.location.as_deref(), Some("London, United Kingdom"));
  }

  #[tokio::test]
  async fn media_download_keeps_content_type() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/img/a.png"))
      .respond_with(ResponseTemplate::new(200).set_body_raw(vec![1u8, 2, 3], "image/png"))
      .mount(&server)
      .await;

    let url = format!("{}/img/a.png?sig=abc", server.uri());
    let blob = client(&server).fetch_media(&url).await.unwrap();
    assert_eq!(blob.bytes.as_ref(), &[1u8, 2, 3]);
    assert_eq!(blob.content_type, "image/png");
  }

  #[tokio::test]
  async fn media_not_found_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/img/gone.jpg"))
      .respond_with(ResponseTemplate::new(404))
      .mount(&server)
      .await;

    let url = format!("{}/img/gone.jpg", server.uri());
    let err = client(&server).fetch_media(&url).await.unwrap_err();
    assert!(matches!(err, Error::MediaUnavailable { status: 404, .. }));
  }
}
