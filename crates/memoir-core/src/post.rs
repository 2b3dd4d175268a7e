//! Upstream feed wire model.
//!
//! These types mirror the JSON returned by the feed API for the explicit
//! field set the feed client requests. Every field is optional upstream, so
//! every field is optional here; unknown fields are ignored.

use serde::{Deserialize, Serialize};

// ─── Posts ───────────────────────────────────────────────────────────────────

/// One post as returned by the feed API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Post {
  /// Upstream identifier; posts without one are never reconciled.
  #[serde(default)]
  pub id:            Option<String>,
  #[serde(default)]
  pub message:       Option<String>,
  #[serde(default)]
  pub story:         Option<String>,
  #[serde(default)]
  pub created_time:  Option<String>,
  #[serde(default)]
  pub updated_time:  Option<String>,
  #[serde(default)]
  pub from:          Option<Author>,
  #[serde(default)]
  pub place:         Option<Place>,
  #[serde(default)]
  pub status_type:   Option<String>,
  #[serde(default)]
  pub attachments:   Option<AttachmentList>,
  #[serde(default)]
  pub full_picture:  Option<String>,
  #[serde(default)]
  pub permalink_url: Option<String>,
}

impl Post {
  /// Top-level attachments in document order.
  pub fn attachments(&self) -> &[Attachment] {
    self.attachments.as_ref().map_or(&[], |l| l.data.as_slice())
  }

  /// Trimmed message text, if non-empty.
  pub fn message_text(&self) -> Option<&str> { non_empty(self.message.as_deref()) }

  /// Trimmed story text, if non-empty.
  pub fn story_text(&self) -> Option<&str> { non_empty(self.story.as_deref()) }

  /// A post qualifies for reconciliation when it carries message or story
  /// text; everything else is feed noise (likes, cover changes, ...).
  pub fn is_qualifying(&self) -> bool {
    self.message_text().is_some() || self.story_text().is_some()
  }

  pub fn place_name(&self) -> Option<&str> {
    non_empty(self.place.as_ref().and_then(|p| p.name.as_deref()))
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Author {
  #[serde(default)]
  pub name:    Option<String>,
  #[serde(default)]
  pub picture: Option<Picture>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Place {
  #[serde(default)]
  pub name: Option<String>,
}

/// A profile picture; the API returns either a bare URL or
/// `{ "data": { "url": ... } }` depending on the field expansion used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Picture {
  Url(String),
  Nested { data: PictureData },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PictureData {
  #[serde(default)]
  pub url: Option<String>,
}

impl Picture {
  pub fn url(&self) -> Option<&str> {
    match self {
      Self::Url(u) => non_empty(Some(u)),
      Self::Nested { data } => non_empty(data.url.as_deref()),
    }
  }
}

// ─── Attachments ─────────────────────────────────────────────────────────────

/// `{ "data": [...] }` wrapper used for both attachments and subattachments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttachmentList {
  #[serde(default)]
  pub data: Vec<Attachment>,
}

/// One node of the attachment tree. Children live in `subattachments`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
  #[serde(rename = "type", default)]
  pub kind:           Option<String>,
  #[serde(default)]
  pub title:          Option<String>,
  #[serde(default)]
  pub description:    Option<String>,
  #[serde(default)]
  pub url:            Option<String>,
  #[serde(default)]
  pub media:          Option<Media>,
  #[serde(default)]
  pub subattachments: Option<AttachmentList>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Media {
  #[serde(default)]
  pub image: Option<Image>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Image {
  #[serde(default)]
  pub src: Option<String>,
}

impl Attachment {
  pub fn children(&self) -> &[Attachment] {
    self.subattachments.as_ref().map_or(&[], |l| l.data.as_slice())
  }

  /// `media.image.src`, if present and non-empty.
  pub fn image_src(&self) -> Option<&str> {
    non_empty(
      self
        .media
        .as_ref()
        .and_then(|m| m.image.as_ref())
        .and_then(|i| i.src.as_deref()),
    )
  }

  pub fn title_text(&self) -> Option<&str> { non_empty(self.title.as_deref()) }

  pub fn description_text(&self) -> Option<&str> {
    non_empty(self.description.as_deref())
  }

  /// Whether the declared type marks this node as a life-event.
  pub fn is_life_event(&self) -> bool {
    self
      .kind
      .as_deref()
      .is_some_and(|k| k.to_ascii_lowercase().contains("life_event"))
  }
}

// ─── Pages & profile ─────────────────────────────────────────────────────────

/// One page of posts, already unwrapped from the API's paging envelope.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedPage {
  pub posts:       Vec<Post>,
  /// Cursor for the next page; `None` once the feed is exhausted.
  pub next_cursor: Option<String>,
}

/// Page-owner attribution, fetched once per batch and used as a fallback
/// when a post omits its author.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthorProfile {
  pub name:     Option<String>,
  pub picture:  Option<String>,
  pub location: Option<String>,
}

fn non_empty(s: Option<&str>) -> Option<&str> {
  s.map(str::trim).filter(|s| !s.is_empty())
}
