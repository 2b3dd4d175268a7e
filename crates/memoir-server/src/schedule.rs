//! The time-based trigger: a chained batch from the head of the feed on a
//! fixed interval.

use std::time::Duration;

use memoir_core::{
  feed::FeedSource,
  store::{BlobStore, EventStore},
};
use memoir_sync::{BatchRequest, Engine};
use tokio::{task::JoinHandle, time::MissedTickBehavior};
use tracing::{error, info};

/// Spawn the scheduled sync loop. The first run starts immediately.
pub fn spawn_scheduled_sync<S, B, F>(
  engine: Engine<S, B, F>,
  request: BatchRequest,
  every: Duration,
) -> JoinHandle<()>
where
  S: EventStore + 'static,
  B: BlobStore + 'static,
  F: FeedSource + 'static,
{
  tokio::spawn(async move {
    info!(interval_secs = every.as_secs(), "scheduled sync started");
    let mut interval = tokio::time::interval(every);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
      interval.tick().await;

      match engine.run_batch(request.clone()).await {
        Ok(summary) => info!(
          processed = summary.processed,
          inserted = summary.inserted,
          updated = summary.updated,
          has_more = summary.has_more,
          "scheduled sync completed"
        ),
        Err(e) => error!(error = %e, "scheduled sync failed"),
      }
    }
  })
}
