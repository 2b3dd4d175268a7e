//! The memoir ingestion engine.
//!
//! [`Engine`] ties the three collaborators together:
//!
//!   FeedSource ──pages──▶ run_batch ──per post──▶ reconcile ──▶ EventStore
//!                                                     └──photos──▶ BlobStore
//!
//! A batch is bounded: it stops once enough posts were reconciled or a page
//! ceiling is reached. Longer backlogs are walked by chaining batches through
//! a [`ContinuationQueue`]. [`janitor::dedupe`] runs independently and
//! collapses rows that racing runs left behind.

pub mod batch;
pub mod chain;
pub mod error;
pub mod janitor;
pub mod reconcile;


use std::sync::Arc;

use memoir_core::{
  feed::FeedSource,
  store::{BlobStore, EventStore},
};

pub use batch::{BatchRequest, BatchSummary};
pub use chain::{ContinuationQueue, spawn_continuation_worker};
pub use error::{Error, Result};
pub use janitor::DedupeSummary;
pub use reconcile::ReconcileOutcome;

/// Default page ceiling per batch.
pub const DEFAULT_MAX_PAGES: u32 = 10;

/// Engine-wide settings that do not vary per request.
#[derive(Debug, Clone)]
pub struct SyncSettings {
  /// Prefix for photo URLs; `{public_base_url}/media/{storage_key}`.
  pub public_base_url: String,
  /// Written to `external_source` on newly inserted events.
  pub external_source: String,
  /// Most pages a single batch may fetch.
  pub max_pages:       u32,
}

impl Default for SyncSettings {
  fn default() -> Self {
    Self {
      public_base_url: String::new(),
      external_source: "feed".to_owned(),
      max_pages:       DEFAULT_MAX_PAGES,
    }
  }
}

/// The reconciliation engine, generic over its collaborators.
///
/// Cloning is cheap; every collaborator sits behind an [`Arc`].
pub struct Engine<S, B, F> {
  store:        Arc<S>,
  blobs:        Arc<B>,
  feed:         Arc<F>,
  settings:     SyncSettings,
  continuation: Option<ContinuationQueue>,
}

impl<S, B, F> Clone for Engine<S, B, F> {
  fn clone(&self) -> Self {
    Self {
      store:        Arc::clone(&self.store),
      blobs:        Arc::clone(&self.blobs),
      feed:         Arc::clone(&self.feed),
      settings:     self.settings.clone(),
      continuation: self.continuation.clone(),
    }
  }
}

impl<S, B, F> Engine<S, B, F>
where
  S: EventStore,
  B: BlobStore,
  F: FeedSource,
{
  pub fn new(store: Arc<S>, blobs: Arc<B>, feed: Arc<F>, settings: SyncSettings) -> Self {
    Self { store, blobs, feed, settings, continuation: None }
  }

  /// Route follow-up batches of chained runs into `queue`.
  ///
  /// Without a queue, `chain` requests are answered with `has_more` and
  /// the caller decides how to continue.
  pub fn with_continuation(mut self, queue: ContinuationQueue) -> Self {
    self.continuation = Some(queue);
    self
  }

  /// Run the duplicate janitor against this engine's stores.
  pub async fn dedupe(&self) -> Result<DedupeSummary> {
    janitor::dedupe(self.store.as_ref(), self.blobs.as_ref()).await
  }
}
