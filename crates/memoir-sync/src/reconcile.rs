//! Idempotent upsert of one post into one event row plus its photo set.
//!
//! Re-running with identical input leaves row counts unchanged: the event is
//! found again by `(origin, external_id)` and overwritten, and every photo
//! URL already stored only has its position refreshed.

use std::collections::{HashMap, HashSet};

use memoir_core::{
  blob::Blob,
  event::{DEFAULT_EVENT_TYPE, EventFields, NewEvent, Origin},
  feed::FeedSource,
  photo::{NewPhoto, Photo},
  post::{Attachment, AuthorProfile, Post},
  store::{BlobStore, EventStore},
};
use memoir_message::{attachments, normalize_source_url, split_headline, structure};
use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{Engine, Error, Result};

/// Event type for life-event posts that declare none.
pub const LIFE_EVENT_TYPE: &str = "milestone";

/// What [`Engine::reconcile`] did with one post.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileOutcome {
  /// `false` when the post carried no upstream id and was ignored.
  pub processed: bool,
  pub inserted:  bool,
  pub updated:   bool,
}

/// Counts from one photo diff; logged, never returned to callers.
#[derive(Debug, Default)]
struct PhotoDiff {
  kept:    usize,
  added:   usize,
  failed:  usize,
  removed: usize,
}

impl<S, B, F> Engine<S, B, F>
where
  S: EventStore,
  B: BlobStore,
  F: FeedSource,
{
  /// Upsert `post` and bring its photos in line with the attachment tree.
  ///
  /// Photo failures are logged and skipped. Store failures abort this post
  /// with [`Error::StoreWriteFailed`].
  pub async fn reconcile(
    &self,
    post: &Post,
    profile: Option<&AuthorProfile>,
    is_life_event: bool,
  ) -> Result<ReconcileOutcome> {
    let Some(external_id) = post.id.as_deref().map(str::trim).filter(|id| !id.is_empty())
    else {
      debug!("post without an id; skipping");
      return Ok(ReconcileOutcome::default());
    };

    let fields = event_fields(post, profile, is_life_event);

    let existing = self
      .store
      .find_event(Origin::Feed, external_id)
      .await
      .map_err(Error::store_write)?;

    let (event_id, inserted) = match existing {
      Some(event) => {
        self
          .store
          .update_event(event.id, fields)
          .await
          .map_err(Error::store_write)?;
        (event.id, false)
      }
      None => {
        let input =
          NewEvent::from_feed(self.settings.external_source.as_str(), external_id, fields);
        let event = self
          .store
          .insert_event(input)
          .await
          .map_err(Error::store_write)?;
        (event.id, true)
      }
    };

    let diff = self
      .sync_photos(event_id, &attachments::photo_urls(post))
      .await?;

    debug!(
      %external_id,
      event_id,
      inserted,
      kept = diff.kept,
      added = diff.added,
      failed = diff.failed,
      removed = diff.removed,
      "reconciled post"
    );

    Ok(ReconcileOutcome { processed: true, inserted, updated: !inserted })
  }

  /// Diff the stored photos of `event_id` against `urls` (upstream order).
  async fn sync_photos(&self, event_id: i64, urls: &[String]) -> Result<PhotoDiff> {
    let mut diff = PhotoDiff::default();

    // First row per normalized URL is the one kept; later rows under the same
    // URL are stale duplicates and go with the orphans.
    let mut stored: HashMap<String, Photo> = HashMap::new();
    let mut stale = Vec::new();
    for photo in self
      .store
      .list_photos(event_id)
      .await
      .map_err(Error::store_write)?
    {
      let key = normalize_source_url(&photo.original_source_url);
      if stored.contains_key(&key) {
        stale.push(photo);
      } else {
        stored.insert(key, photo);
      }
    }

    let mut seen = HashSet::new();
    let mut position = 0u32;

    for url in urls {
      let key = normalize_source_url(url);
      if !seen.insert(key.clone()) {
        continue;
      }

      if let Some(photo) = stored.get(&key) {
        if photo.position != position {
          self
            .store
            .update_photo_position(photo.id, position)
            .await
            .map_err(Error::store_write)?;
        }
        diff.kept += 1;
        position += 1;
        continue;
      }

      match self.add_photo(event_id, url, position).await {
        Ok(_) => {
          diff.added += 1;
          position += 1;
        }
        Err(e @ Error::PhotoFetchFailed { .. }) => {
          warn!(event_id, %url, error = %e, "photo skipped");
          diff.failed += 1;
        }
        Err(e) => return Err(e),
      }
    }

    let orphans = stored
      .into_iter()
      .filter(|(key, _)| !seen.contains(key))
      .map(|(_, photo)| photo)
      .chain(stale);
    for photo in orphans {
      self.remove_photo(&photo).await?;
      diff.removed += 1;
    }

    Ok(diff)
  }

  /// Download `url`, store its bytes under a fresh key, and insert the row.
  async fn add_photo(&self, event_id: i64, url: &str, position: u32) -> Result<Photo> {
    let blob = self
      .feed
      .fetch_media(url)
      .await
      .map_err(|e| Error::photo(url, e))?;

    let storage_key = storage_key(event_id, &blob);
    self
      .blobs
      .put(&storage_key, blob.bytes, &blob.content_type)
      .await
      .map_err(|e| Error::photo(url, e))?;

    let input = NewPhoto {
      event_id,
      public_url: public_url(&self.settings.public_base_url, &storage_key),
      storage_key: storage_key.clone(),
      original_source_url: url.to_owned(),
      position,
    };

    match self.store.insert_photo(input).await {
      Ok(photo) => Ok(photo),
      Err(e) => {
        if let Err(cleanup) = self.blobs.delete(&storage_key).await {
          warn!(%storage_key, error = %cleanup, "failed to remove blob of unrecorded photo");
        }
        Err(Error::store_write(e))
      }
    }
  }

  /// Delete a photo's blob (best-effort), then its row.
  pub(crate) async fn remove_photo(&self, photo: &Photo) -> Result<()> {
    remove_photo(self.store.as_ref(), self.blobs.as_ref(), photo).await
  }
}

pub(crate) async fn remove_photo<S, B>(store: &S, blobs: &B, photo: &Photo) -> Result<()>
where
  S: EventStore,
  B: BlobStore,
{
  if let Err(e) = blobs.delete(&photo.storage_key).await {
    warn!(photo_id = photo.id, storage_key = %photo.storage_key, error = %e, "blob delete failed");
  }
  store
    .delete_photo(photo.id)
    .await
    .map_err(Error::store_write)
}

// ─── Field derivation ─────────────────────────────────────────────────────────

/// Derive the mutable event fields for `post`.
pub fn event_fields(
  post: &Post,
  profile: Option<&AuthorProfile>,
  is_life_event: bool,
) -> EventFields {
  let roots = post.attachments();
  let primary = attachments::primary(post);

  let parsed = structure(
    raw_text(post, primary, is_life_event),
    post.created_time.as_deref(),
    roots,
    primary,
    post.place_name(),
  );

  let headline = split_headline(parsed.title.as_deref().unwrap_or(&parsed.description));

  let default_type = if is_life_event { LIFE_EVENT_TYPE } else { DEFAULT_EVENT_TYPE };

  let author = post.from.as_ref();
  let posted_by_name = author
    .and_then(|a| a.name.as_deref())
    .map(str::trim)
    .filter(|n| !n.is_empty())
    .map(str::to_owned)
    .or_else(|| profile.and_then(|p| p.name.clone()));
  let posted_by_photo = author
    .and_then(|a| a.picture.as_ref())
    .and_then(|p| p.url())
    .map(str::to_owned)
    .or_else(|| profile.and_then(|p| p.picture.clone()));

  EventFields {
    event_date: parsed.event_date,
    event_type: parsed.event_type.unwrap_or_else(|| default_type.to_owned()),
    event_name_line_1: headline.line_1,
    event_name_line_2: headline.line_2,
    event_description: parsed.description,
    posted_by_name,
    posted_by_photo,
  }
}

/// The text handed to the structurer. An empty string lets the structurer
/// fall back to the attachment tree; story text only wins when the tree is
/// silent too.
fn raw_text<'a>(post: &'a Post, primary: Option<&'a Attachment>, is_life_event: bool) -> &'a str {
  if let Some(message) = post.message_text() {
    return message;
  }
  if is_life_event && let Some(description) = primary.and_then(Attachment::description_text) {
    return description;
  }
  if attachments::first_text(post.attachments()).is_some() {
    return "";
  }
  post.story_text().unwrap_or_default()
}

fn storage_key(event_id: i64, blob: &Blob) -> String {
  format!("photos/{event_id}/{}.{}", Uuid::new_v4(), blob.extension())
}

fn public_url(base: &str, storage_key: &str) -> String {
  format!("{}/media/{storage_key}", base.trim_end_matches('/'))
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn post(value: serde_json::Value) -> Post { serde_json::from_value(value).unwrap() }

  #[test]
  fn plain_message_becomes_headline_and_description() {
    let p = post(json!({
      "id": "1_1",
      "message": "Hello\nworld extra text",
      "created_time": "2024-03-01T10:00:00+0000",
      "from": { "name": "Ada" }
    }));
    let f = event_fields(&p, None, false);
    assert_eq!(f.event_name_line_1, "Hello");
    assert_eq!(f.event_name_line_2.as_deref(), Some("world extra text"));
    assert_eq!(f.event_description, "Hello\nworld extra text");
    assert_eq!(f.event_date.as_deref(), Some("2024-03-01T10:00:00+0000"));
    assert_eq!(f.event_type, DEFAULT_EVENT_TYPE);
    assert_eq!(f.posted_by_name.as_deref(), Some("Ada"));
  }

  #[test]
  fn labeled_title_drives_the_headline() {
    let p = post(json!({
      "id": "1_2",
      "message": "Name: Graduation\nDate: 2020-05-01\nPost: Proud moment"
    }));
    let f = event_fields(&p, None, false);
    assert_eq!(f.event_name_line_1, "Graduation");
    assert_eq!(f.event_name_line_2, None);
    assert_eq!(f.event_description, "Proud moment");
    assert_eq!(f.event_date.as_deref(), Some("2020-05-01"));
  }

  #[test]
  fn profile_fills_missing_attribution() {
    let profile = AuthorProfile {
      name:     Some("Page Owner".into()),
      picture:  Some("https://cdn.example.com/owner.jpg".into()),
      location: None,
    };
    let p = post(json!({ "id": "1_3", "message": "hi" }));
    let f = event_fields(&p, Some(&profile), false);
    assert_eq!(f.posted_by_name.as_deref(), Some("Page Owner"));
    assert_eq!(f.posted_by_photo.as_deref(), Some("https://cdn.example.com/owner.jpg"));

    let p = post(json!({
      "id": "1_4",
      "message": "hi",
      "from": { "name": "Ada", "picture": { "data": { "url": "https://cdn.example.com/ada.jpg" } } }
    }));
    let f = event_fields(&p, Some(&profile), false);
    assert_eq!(f.posted_by_name.as_deref(), Some("Ada"));
    assert_eq!(f.posted_by_photo.as_deref(), Some("https://cdn.example.com/ada.jpg"));
  }

  #[test]
  fn life_event_without_message_uses_primary_description() {
    let p = post(json!({
      "id": "1_5",
      "story": "Ada added a life event.",
      "attachments": { "data": [
        { "type": "photo", "title": "Album", "description": "Beach day" },
        { "type": "life_event", "title": "Started a new job", "description": "Joined the lab" }
      ]}
    }));
    let f = event_fields(&p, None, true);
    assert_eq!(f.event_description, "Joined the lab");
    assert_eq!(f.event_name_line_1, "Started a new job");
    assert_eq!(f.event_type, "life_event");
  }

  #[test]
  fn life_event_without_any_type_defaults_to_milestone() {
    let p = post(json!({
      "id": "1_6",
      "message": "We got married",
      "status_type": "created_life_event"
    }));
    let f = event_fields(&p, None, true);
    assert_eq!(f.event_type, LIFE_EVENT_TYPE);
  }

  #[test]
  fn story_only_post_keeps_story_ahead_of_location() {
    let p = post(json!({
      "id": "1_7",
      "story": "Ada was at the museum.",
      "place": { "name": "Science Museum" }
    }));
    let f = event_fields(&p, None, false);
    assert_eq!(f.event_description, "Ada was at the museum.\nLocation: Science Museum");
    assert_eq!(f.event_name_line_1, "Ada was at the museum.");
  }

  #[test]
  fn attachment_text_beats_story_text() {
    let p = post(json!({
      "id": "1_8",
      "story": "Ada shared a link.",
      "attachments": { "data": [ { "type": "share", "description": "A great read" } ] }
    }));
    let f = event_fields(&p, None, false);
    assert_eq!(f.event_description, "A great read");
  }

  #[test]
  fn public_url_joins_base_and_key() {
    assert_eq!(
      public_url("https://memoir.example.com/", "photos/1/a.jpg"),
      "https://memoir.example.com/media/photos/1/a.jpg"
    );
    let key = storage_key(7, &Blob::new(vec![], "image/png"));
    assert!(key.starts_with("photos/7/"));
    assert!(key.ends_with(".png"));
  }
}
