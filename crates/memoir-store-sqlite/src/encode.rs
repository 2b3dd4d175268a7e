//! Encoding and decoding helpers between Rust domain types and the plain
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, booleans as 0/1 integers, and
//! [`Origin`] as its lowercase name.

use chrono::{DateTime, Utc};
use memoir_core::{
  event::{Event, EventFields, EventIdentity, Origin},
  photo::Photo,
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Position ────────────────────────────────────────────────────────────────

pub fn decode_position(v: i64) -> Result<u32> {
  u32::try_from(v).map_err(|_| Error::Corrupt {
    column: "position",
    value:  v.to_string(),
  })
}

// ─── Column lists ────────────────────────────────────────────────────────────

/// Column order expected by [`raw_event`].
pub const EVENT_COLUMNS: &str = "id, origin, external_source, external_id,
  event_date, event_type, event_name_line_1, event_name_line_2,
  event_description, posted_by_name, posted_by_photo,
  sync, active, approved, created_at, updated_at";

/// Column order expected by [`raw_photo`].
pub const PHOTO_COLUMNS: &str = "id, event_id, storage_key, public_url,
  original_source_url, position, created_at, updated_at";

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from an `events` row.
pub struct RawEvent {
  pub id:                i64,
  pub origin:            String,
  pub external_source:   Option<String>,
  pub external_id:       Option<String>,
  pub event_date:        Option<String>,
  pub event_type:        String,
  pub event_name_line_1: String,
  pub event_name_line_2: Option<String>,
  pub event_description: String,
  pub posted_by_name:    Option<String>,
  pub posted_by_photo:   Option<String>,
  pub sync:              bool,
  pub active:            bool,
  pub approved:          bool,
  pub created_at:        String,
  pub updated_at:        String,
}

pub fn raw_event(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawEvent> {
  Ok(RawEvent {
    id:                row.get(0)?,
    origin:            row.get(1)?,
    external_source:   row.get(2)?,
    external_id:       row.get(3)?,
    event_date:        row.get(4)?,
    event_type:        row.get(5)?,
    event_name_line_1: row.get(6)?,
    event_name_line_2: row.get(7)?,
    event_description: row.get(8)?,
    posted_by_name:    row.get(9)?,
    posted_by_photo:   row.get(10)?,
    sync:              row.get(11)?,
    active:            row.get(12)?,
    approved:          row.get(13)?,
    created_at:        row.get(14)?,
    updated_at:        row.get(15)?,
  })
}

impl RawEvent {
  pub fn into_event(self) -> Result<Event> {
    Ok(Event {
      id:              self.id,
      origin:          Origin::parse(&self.origin)?,
      external_source: self.external_source,
      external_id:     self.external_id,
      fields:          EventFields {
        event_date:        self.event_date,
        event_type:        self.event_type,
        event_name_line_1: self.event_name_line_1,
        event_name_line_2: self.event_name_line_2,
        event_description: self.event_description,
        posted_by_name:    self.posted_by_name,
        posted_by_photo:   self.posted_by_photo,
      },
      needs_sync:      self.sync,
      active:          self.active,
      approved:        self.approved,
      created_at:      decode_dt(&self.created_at)?,
      updated_at:      decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw values read from the identity columns of an `events` row.
pub struct RawIdentity {
  pub id:              i64,
  pub origin:          String,
  pub external_source: Option<String>,
  pub external_id:     Option<String>,
}

impl RawIdentity {
  pub fn into_identity(self) -> Result<EventIdentity> {
    Ok(EventIdentity {
      id:              self.id,
      origin:          Origin::parse(&self.origin)?,
      external_source: self.external_source,
      external_id:     self.external_id,
    })
  }
}

/// Raw values read directly from a `photos` row.
pub struct RawPhoto {
  pub id:                  i64,
  pub event_id:            i64,
  pub storage_key:         String,
  pub public_url:          String,
  pub original_source_url: String,
  pub position:            i64,
  pub created_at:          String,
  pub updated_at:          String,
}

pub fn raw_photo(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawPhoto> {
  Ok(RawPhoto {
    id:                  row.get(0)?,
    event_id:            row.get(1)?,
    storage_key:         row.get(2)?,
    public_url:          row.get(3)?,
    original_source_url: row.get(4)?,
    position:            row.get(5)?,
    created_at:          row.get(6)?,
    updated_at:          row.get(7)?,
  })
}

impl RawPhoto {
  pub fn into_photo(self) -> Result<Photo> {
    Ok(Photo {
      id:                  self.id,
      event_id:            self.event_id,
      storage_key:         self.storage_key,
      public_url:          self.public_url,
      original_source_url: self.original_source_url,
      position:            decode_position(self.position)?,
      created_at:          decode_dt(&self.created_at)?,
      updated_at:          decode_dt(&self.updated_at)?,
    })
  }
}
