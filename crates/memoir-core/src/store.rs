//! The `EventStore` and `BlobStore` traits.
//!
//! Both are implemented by storage backends (e.g. `memoir-store-sqlite`).
//! The sync engine depends on these abstractions, not on any concrete
//! backend. Every method is a single statement-level operation; callers must
//! not assume transactions spanning several calls.

use std::future::Future;

use bytes::Bytes;

use crate::{
  blob::Blob,
  event::{Event, EventFields, EventIdentity, NewEvent, Origin},
  photo::{NewPhoto, Photo},
};

// ─── Events & photos ─────────────────────────────────────────────────────────

/// Abstraction over the normalized event/photo tables.
///
/// All methods return `Send` futures so the trait can be used from spawned
/// tokio tasks.
pub trait EventStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Events ────────────────────────────────────────────────────────────

  /// Look up an event by its natural key `(origin, external_id)`.
  ///
  /// If racing writers left several rows under the key, the lowest id wins,
  /// matching what the duplicate janitor keeps.
  fn find_event<'a>(
    &'a self,
    origin: Origin,
    external_id: &'a str,
  ) -> impl Future<Output = Result<Option<Event>, Self::Error>> + Send + 'a;

  fn get_event(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<Event>, Self::Error>> + Send + '_;

  /// Insert a new event; the store assigns `id` and both timestamps.
  fn insert_event(
    &self,
    input: NewEvent,
  ) -> impl Future<Output = Result<Event, Self::Error>> + Send + '_;

  /// Overwrite the mutable fields of an existing event, bump `updated_at`,
  /// and flag it as needing a push to the other system.
  fn update_event(
    &self,
    id: i64,
    fields: EventFields,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Delete an event. Its photo rows go with it; their blobs do not.
  fn delete_event(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Identity columns of every event, ordered by id.
  fn list_event_identities(
    &self,
  ) -> impl Future<Output = Result<Vec<EventIdentity>, Self::Error>> + Send + '_;

  // ── Photos ────────────────────────────────────────────────────────────

  /// All photos of one event ordered by position, then id.
  fn list_photos(
    &self,
    event_id: i64,
  ) -> impl Future<Output = Result<Vec<Photo>, Self::Error>> + Send + '_;

  /// Every photo in the store ordered by event, then id.
  fn list_all_photos(
    &self,
  ) -> impl Future<Output = Result<Vec<Photo>, Self::Error>> + Send + '_;

  fn insert_photo(
    &self,
    input: NewPhoto,
  ) -> impl Future<Output = Result<Photo, Self::Error>> + Send + '_;

  fn update_photo_position(
    &self,
    id: i64,
    position: u32,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn delete_photo(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Push-sync surface ─────────────────────────────────────────────────

  /// Approved, active events flagged as needing a push, oldest update first.
  fn list_pending_sync(
    &self,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<Event>, Self::Error>> + Send + '_;

  /// Clear the needs-push flag after the CMS accepted the event.
  fn mark_synced(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}

// ─── Blobs ───────────────────────────────────────────────────────────────────

/// Keyed object storage for downloaded photo bytes.
pub trait BlobStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Store `bytes` under `key`, replacing anything already there.
  fn put<'a>(
    &'a self,
    key: &'a str,
    bytes: Bytes,
    content_type: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  fn get<'a>(
    &'a self,
    key: &'a str,
  ) -> impl Future<Output = Result<Option<Blob>, Self::Error>> + Send + 'a;

  /// Delete `key`. Deleting a missing key is not an error.
  fn delete<'a>(
    &'a self,
    key: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}
