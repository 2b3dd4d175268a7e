//! The batch controller: page through the feed until enough posts were
//! reconciled, the feed runs dry, or the page ceiling is hit.

use memoir_core::{
  feed::FeedSource,
  post::AuthorProfile,
  store::{BlobStore, EventStore},
};
use memoir_message::attachments;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{Engine, Error, Result};

/// Resumable state of one bounded run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRequest {
  /// Where to resume; `None` starts at the head of the feed.
  pub cursor:       Option<String>,
  /// Stop after at least this many posts were reconciled.
  pub target_count: u32,
  /// Page size asked of the feed.
  pub limit:        u32,
  /// Enqueue a follow-up batch when this one stops with work remaining.
  pub chain:        bool,
}

/// Counts and continuation state returned by [`Engine::run_batch`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
  pub processed:   u32,
  pub inserted:    u32,
  pub updated:     u32,
  /// Posts whose reconciliation failed; they are retried on a later run.
  pub failed:      u32,
  pub pages:       u32,
  pub next_cursor: Option<String>,
  pub has_more:    bool,
}

impl<S, B, F> Engine<S, B, F>
where
  S: EventStore,
  B: BlobStore,
  F: FeedSource,
{
  /// Run one bounded batch.
  ///
  /// Pages are reconciled whole, so the returned cursor never skips a post.
  /// Only a feed failure aborts the batch; per-post failures are counted in
  /// [`BatchSummary::failed`].
  pub async fn run_batch(&self, request: BatchRequest) -> Result<BatchSummary> {
    let profile = self.fetch_profile().await;
    let max_pages = self.settings.max_pages.max(1);

    let mut summary = BatchSummary::default();
    let mut cursor = request.cursor.clone();

    while summary.pages < max_pages {
      let page = self
        .feed
        .fetch_page(cursor.clone(), request.limit)
        .await
        .map_err(Error::feed)?;
      summary.pages += 1;

      debug!(
        page = summary.pages,
        posts = page.posts.len(),
        cursor = cursor.as_deref().unwrap_or("<head>"),
        "processing feed page"
      );

      for post in page.posts.iter().filter(|p| p.is_qualifying()) {
        let is_life_event = attachments::is_life_event(post);
        match self.reconcile(post, profile.as_ref(), is_life_event).await {
          Ok(outcome) if outcome.processed => {
            summary.processed += 1;
            summary.inserted += u32::from(outcome.inserted);
            summary.updated += u32::from(outcome.updated);
          }
          Ok(_) => {}
          Err(e) => {
            summary.failed += 1;
            warn!(
              external_id = post.id.as_deref().unwrap_or_default(),
              error = %e,
              "post reconciliation failed; skipping"
            );
          }
        }
      }

      cursor = page.next_cursor;
      if summary.processed >= request.target_count || cursor.is_none() {
        break;
      }
    }

    summary.next_cursor = cursor;
    summary.has_more = summary.processed >= request.target_count && summary.next_cursor.is_some();

    info!(
      processed = summary.processed,
      inserted = summary.inserted,
      updated = summary.updated,
      failed = summary.failed,
      pages = summary.pages,
      has_more = summary.has_more,
      "batch finished"
    );

    if request.chain && summary.has_more {
      self.chain_next(&request, &summary);
    }

    Ok(summary)
  }

  /// Profile failures only cost the attribution fallback.
  async fn fetch_profile(&self) -> Option<AuthorProfile> {
    match self.feed.fetch_profile().await {
      Ok(profile) => Some(profile),
      Err(e) => {
        warn!(error = %e, "author profile unavailable; continuing without it");
        None
      }
    }
  }

  fn chain_next(&self, request: &BatchRequest, summary: &BatchSummary) {
    let Some(queue) = &self.continuation else {
      debug!("no continuation queue; leaving the chain to the caller");
      return;
    };
    queue.enqueue(BatchRequest {
      cursor: summary.next_cursor.clone(),
      chain: true,
      ..request.clone()
    });
  }
}
