//! Photos: ordered images belonging to exactly one event.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A persisted photo row.
///
/// Within one event the normalized `original_source_url` is unique and
/// `position` forms a dense `0..n` sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Photo {
  pub id:                  i64,
  pub event_id:            i64,
  /// Key of the bytes in the blob store; unique across all photos.
  pub storage_key:         String,
  pub public_url:          String,
  /// Upstream URL the bytes were downloaded from.
  pub original_source_url: String,
  pub position:            u32,
  pub created_at:          DateTime<Utc>,
  pub updated_at:          DateTime<Utc>,
}

/// Input for [`EventStore::insert_photo`](crate::store::EventStore::insert_photo).
#[derive(Debug, Clone)]
pub struct NewPhoto {
  pub event_id:            i64,
  pub storage_key:         String,
  pub public_url:          String,
  pub original_source_url: String,
  pub position:            u32,
}
