//! The duplicate janitor.
//!
//! Racing runs can leave several rows under one natural key. Each pass
//! groups rows by a key, keeps the lowest id and deletes the rest:
//!
//! 1. events by `(external_source, external_id)`
//! 2. feed events by `external_id`, the key reconciliation looks up by;
//!    CMS rows are only ever grouped by the first pass
//! 3. photos by `(event_id, normalized original_source_url)`
//!
//! Blobs are deleted before their rows. A failed blob delete is logged and
//! the row goes anyway; the row is the source of truth.

use std::{
  collections::{HashMap, HashSet},
  hash::Hash,
};

use memoir_core::{
  event::{EventIdentity, Origin},
  store::{BlobStore, EventStore},
};
use memoir_message::normalize_source_url;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{Error, Result, reconcile::remove_photo};

/// Rows removed by one [`dedupe`] run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DedupeSummary {
  pub events_removed: u32,
  pub photos_removed: u32,
}

/// Run all three passes against `store` and `blobs`.
pub async fn dedupe<S, B>(store: &S, blobs: &B) -> Result<DedupeSummary>
where
  S: EventStore,
  B: BlobStore,
{
  let mut summary = DedupeSummary::default();

  let identities = store
    .list_event_identities()
    .await
    .map_err(Error::store_read)?;

  let by_source = duplicates(identities.iter().map(|e| (e.id, source_key(e))));
  let removed: HashSet<i64> = by_source.iter().copied().collect();
  let by_origin = duplicates(
    identities
      .iter()
      .filter(|e| !removed.contains(&e.id))
      .map(|e| (e.id, origin_key(e))),
  );

  for id in by_source.into_iter().chain(by_origin) {
    summary.photos_removed += remove_event(store, blobs, id).await?;
    summary.events_removed += 1;
  }

  let photos = store.list_all_photos().await.map_err(Error::store_read)?;
  let dupes: HashSet<i64> = duplicates(
    photos
      .iter()
      .map(|p| (p.id, Some((p.event_id, normalize_source_url(&p.original_source_url))))),
  )
  .into_iter()
  .collect();

  for photo in photos.iter().filter(|p| dupes.contains(&p.id)) {
    debug!(photo_id = photo.id, event_id = photo.event_id, "removing duplicate photo");
    remove_photo(store, blobs, photo).await?;
    summary.photos_removed += 1;
  }

  info!(
    events_removed = summary.events_removed,
    photos_removed = summary.photos_removed,
    "dedupe finished"
  );
  Ok(summary)
}

/// Delete one event and the blobs of its photos. Returns the photo count.
async fn remove_event<S, B>(store: &S, blobs: &B, id: i64) -> Result<u32>
where
  S: EventStore,
  B: BlobStore,
{
  let photos = store.list_photos(id).await.map_err(Error::store_read)?;
  for photo in &photos {
    if let Err(e) = blobs.delete(&photo.storage_key).await {
      warn!(photo_id = photo.id, error = %e, "blob delete failed");
    }
  }

  debug!(event_id = id, photos = photos.len(), "removing duplicate event");
  store.delete_event(id).await.map_err(Error::store_write)?;
  Ok(u32::try_from(photos.len()).unwrap_or(u32::MAX))
}

fn source_key(e: &EventIdentity) -> Option<(String, String)> {
  Some((e.external_source.clone()?, e.external_id.clone()?))
}

fn origin_key(e: &EventIdentity) -> Option<(Origin, String)> {
  if e.origin != Origin::Feed {
    return None;
  }
  Some((e.origin, e.external_id.clone()?))
}

/// Ids of every row whose key was already claimed by a lower id.
///
/// Rows with no key never group.
fn duplicates<K: Eq + Hash>(rows: impl IntoIterator<Item = (i64, Option<K>)>) -> Vec<i64> {
  let mut keepers: HashMap<K, i64> = HashMap::new();
  let mut losers = Vec::new();

  let mut rows: Vec<_> = rows
    .into_iter()
    .filter_map(|(id, key)| Some((id, key?)))
    .collect();
  rows.sort_by_key(|(id, _)| *id);

  for (id, key) in rows {
    if keepers.contains_key(&key) {
      losers.push(id);
    } else {
      keepers.insert(key, id);
    }
  }
  losers
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn duplicates_keep_the_lowest_id() {
    let rows = vec![(5, Some("a")), (2, Some("a")), (3, Some("b")), (9, Some("a"))];
    assert_eq!(duplicates(rows), vec![5, 9]);
  }

  #[test]
  fn rows_without_a_key_never_group() {
    let rows: Vec<(i64, Option<&str>)> = vec![(1, None), (2, None), (3, Some("x"))];
    assert!(duplicates(rows).is_empty());
  }

  #[test]
  fn source_key_needs_both_halves() {
    let e = EventIdentity {
      id:              1,
      origin:          Origin::Feed,
      external_source: None,
      external_id:     Some("1_1".into()),
    };
    assert_eq!(source_key(&e), None);
    assert_eq!(origin_key(&e), Some((Origin::Feed, "1_1".to_owned())));
  }

  #[test]
  fn origin_key_only_covers_feed_rows() {
    let e = EventIdentity {
      id:              1,
      origin:          Origin::Cms,
      external_source: Some("collection-a".into()),
      external_id:     Some("item-1".into()),
    };
    assert_eq!(origin_key(&e), None);
  }
}
