//! Trigger endpoints.
//!
//! | Method | Path | Body | Returns |
//! |--------|------|------|---------|
//! | `POST` | `/sync` | optional `{cursor, limit, target_count, chain}` | `BatchSummary` |
//! | `POST` | `/dedupe` | none | `DedupeSummary` |

use axum::{Json, body::Bytes, extract::State};
use memoir_core::{
  feed::FeedSource,
  store::{BlobStore, EventStore},
};
use memoir_sync::{BatchRequest, BatchSummary, DedupeSummary};
use serde::Deserialize;
use tracing::info;

use crate::{AppState, auth::Authenticated, config::SyncConfig, error::Error};

/// Body of `POST /sync`; absent fields fall back to `[sync]` config.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SyncBody {
  pub cursor:       Option<String>,
  pub limit:        Option<u32>,
  pub target_count: Option<u32>,
  pub chain:        Option<bool>,
}

impl SyncBody {
  pub fn into_request(self, defaults: &SyncConfig) -> BatchRequest {
    BatchRequest {
      cursor:       self.cursor.filter(|c| !c.is_empty()),
      target_count: self.target_count.unwrap_or(defaults.target_count),
      limit:        self.limit.unwrap_or(defaults.page_limit),
      chain:        self.chain.unwrap_or(false),
    }
  }
}

/// `POST /sync`
pub async fn sync<S, B, F>(
  _: Authenticated,
  State(state): State<AppState<S, B, F>>,
  body: Bytes,
) -> Result<Json<BatchSummary>, Error>
where
  S: EventStore + 'static,
  B: BlobStore + 'static,
  F: FeedSource + 'static,
{
  let body: SyncBody = if body.iter().all(u8::is_ascii_whitespace) {
    SyncBody::default()
  } else {
    serde_json::from_slice(&body).map_err(|e| Error::BadRequest(e.to_string()))?
  };
  let request = body.into_request(&state.sync);

  info!(cursor = ?request.cursor, chain = request.chain, "sync triggered");
  Ok(Json(state.engine.run_batch(request).await?))
}

/// `POST /dedupe`
pub async fn dedupe<S, B, F>(
  _: Authenticated,
  State(state): State<AppState<S, B, F>>,
) -> Result<Json<DedupeSummary>, Error>
where
  S: EventStore + 'static,
  B: BlobStore + 'static,
  F: FeedSource + 'static,
{
  info!("dedupe triggered");
  Ok(Json(state.engine.dedupe().await?))
}
