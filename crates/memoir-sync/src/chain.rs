//! In-process continuation of chained batches.
//!
//! A chained batch that stops with work remaining pushes its follow-up
//! [`BatchRequest`] onto a [`ContinuationQueue`]. One worker task drains the
//! queue, running a single batch at a time. Nothing is persisted: a dropped
//! link only delays progress until the next scheduled run.

use memoir_core::{
  feed::FeedSource,
  store::{BlobStore, EventStore},
};
use tokio::{
  sync::mpsc::{self, UnboundedReceiver, UnboundedSender},
  task::JoinHandle,
};
use tracing::{error, info, warn};

use crate::{BatchRequest, Engine};

/// Sending half of the continuation channel. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ContinuationQueue {
  tx: UnboundedSender<BatchRequest>,
}

impl ContinuationQueue {
  /// Create a queue and the receiver a worker drains.
  pub fn channel() -> (Self, UnboundedReceiver<BatchRequest>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Self { tx }, rx)
  }

  /// Queue a follow-up batch without waiting for it. Returns `false` when the
  /// worker is gone.
  pub fn enqueue(&self, request: BatchRequest) -> bool {
    let cursor = request.cursor.clone();
    match self.tx.send(request) {
      Ok(()) => {
        info!(cursor = cursor.as_deref().unwrap_or("<head>"), "chained batch queued");
        true
      }
      Err(_) => {
        warn!(
          cursor = cursor.as_deref().unwrap_or("<head>"),
          "continuation worker gone; chain link dropped"
        );
        false
      }
    }
  }
}

/// Spawn the task that runs queued follow-up batches. Failures are logged and
/// never escalated.
///
/// The loop ends once every [`ContinuationQueue`] is dropped. An engine that
/// holds its own queue keeps it open, so abort the handle to stop the worker.
pub fn spawn_continuation_worker<S, B, F>(
  engine: Engine<S, B, F>,
  mut rx: UnboundedReceiver<BatchRequest>,
) -> JoinHandle<()>
where
  S: EventStore + 'static,
  B: BlobStore + 'static,
  F: FeedSource + 'static,
{
  tokio::spawn(async move {
    info!("continuation worker started");
    while let Some(request) = rx.recv().await {
      let cursor = request.cursor.clone();
      if let Err(e) = engine.run_batch(request).await {
        error!(
          cursor = cursor.as_deref().unwrap_or("<head>"),
          error = %e,
          "chained batch failed"
        );
      }
    }
    info!("continuation worker stopped");
  })
}
