//! Events: one logical timeline entry in the normalized store.
//!
//! An event is created on the first sighting of an upstream object and fully
//! overwritten on every later sighting. Normal sync never deletes events; only
//! the duplicate janitor removes redundant rows.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::{Error, Result};

/// Default category for events that carry no explicit type.
pub const DEFAULT_EVENT_TYPE: &str = "memory";

// ─── Provenance ──────────────────────────────────────────────────────────────

/// Which system an event originated in.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  AsRefStr,
  Display,
  EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Origin {
  /// Ingested from the social feed.
  Feed,
  /// Authored in the CMS and pulled in from there.
  Cms,
}

impl Origin {
  pub fn parse(s: &str) -> Result<Self> {
    Self::from_str(s).map_err(|_| Error::UnknownOrigin(s.to_owned()))
  }
}

// ─── Mutable fields ──────────────────────────────────────────────────────────

/// The fields a reconciliation pass overwrites on every sighting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventFields {
  /// Display date; a free-form upstream string.
  pub event_date:        Option<String>,
  pub event_type:        String,
  /// Headline, never empty, at most 120 characters.
  pub event_name_line_1: String,
  /// Subheadline, at most 180 characters.
  pub event_name_line_2: Option<String>,
  pub event_description: String,
  pub posted_by_name:    Option<String>,
  pub posted_by_photo:   Option<String>,
}

impl Default for EventFields {
  fn default() -> Self {
    Self {
      event_date:        None,
      event_type:        DEFAULT_EVENT_TYPE.to_owned(),
      event_name_line_1: "Memory".to_owned(),
      event_name_line_2: None,
      event_description: String::new(),
      posted_by_name:    None,
      posted_by_photo:   None,
    }
  }
}

// ─── Rows ────────────────────────────────────────────────────────────────────

/// A persisted event row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
  /// Store-assigned, immutable.
  pub id:              i64,
  pub origin:          Origin,
  pub external_source: Option<String>,
  pub external_id:     Option<String>,
  #[serde(flatten)]
  pub fields:          EventFields,
  /// `true` when the row still needs to be pushed to the other system.
  pub needs_sync:      bool,
  pub active:          bool,
  pub approved:        bool,
  pub created_at:      DateTime<Utc>,
  pub updated_at:      DateTime<Utc>,
}

/// Input for [`EventStore::insert_event`](crate::store::EventStore::insert_event).
#[derive(Debug, Clone)]
pub struct NewEvent {
  pub origin:          Origin,
  pub external_source: Option<String>,
  pub external_id:     Option<String>,
  pub fields:          EventFields,
  pub needs_sync:      bool,
  pub active:          bool,
  pub approved:        bool,
}

impl NewEvent {
  /// A freshly sighted feed post: needs push, active, not yet approved.
  pub fn from_feed(
    external_source: impl Into<String>,
    external_id: impl Into<String>,
    fields: EventFields,
  ) -> Self {
    Self {
      origin: Origin::Feed,
      external_source: Some(external_source.into()),
      external_id: Some(external_id.into()),
      fields,
      needs_sync: true,
      active: true,
      approved: false,
    }
  }
}

/// The identity columns of an event; what the duplicate janitor groups on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventIdentity {
  pub id:              i64,
  pub origin:          Origin,
  pub external_source: Option<String>,
  pub external_id:     Option<String>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn origin_round_trips_through_its_column_text() {
    assert_eq!(Origin::Feed.as_ref(), "feed");
    assert_eq!(Origin::Cms.to_string(), "cms");
    assert_eq!(Origin::parse("feed").unwrap(), Origin::Feed);
    assert!(matches!(
      Origin::parse("webflow"),
      Err(Error::UnknownOrigin(ref s)) if s == "webflow"
    ));
  }

  #[test]
  fn new_feed_event_needs_push_and_is_unapproved() {
    let e = NewEvent::from_feed("feed", "123_456", EventFields::default());
    assert_eq!(e.origin, Origin::Feed);
    assert!(e.needs_sync);
    assert!(e.active);
    assert!(!e.approved);
    assert_eq!(e.fields.event_type, DEFAULT_EVENT_TYPE);
  }
}
