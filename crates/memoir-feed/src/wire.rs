//! Response envelopes that never leave this crate.

use memoir_core::post::{AuthorProfile, FeedPage, Picture, Post};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct PageEnvelope {
  #[serde(default)]
  pub data:   Vec<Post>,
  #[serde(default)]
  pub paging: Option<Paging>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Paging {
  #[serde(default)]
  pub cursors: Option<Cursors>,
  /// Present only when another page exists.
  #[serde(default)]
  pub next:    Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Cursors {
  #[serde(default)]
  pub after: Option<String>,
}

impl PageEnvelope {
  /// The API hands out an `after` cursor even on the final page; only trust
  /// it when `next` says another page exists.
  pub fn into_page(self) -> FeedPage {
    let next_cursor = self
      .paging
      .filter(|p| p.next.is_some())
      .and_then(|p| p.cursors)
      .and_then(|c| c.after)
      .filter(|after| !after.is_empty());

    FeedPage { posts: self.data, next_cursor }
  }
}

#[derive(Debug, Deserialize)]
pub struct ProfileEnvelope {
  #[serde(default)]
  pub name:     Option<String>,
  #[serde(default)]
  pub picture:  Option<Picture>,
  #[serde(default)]
  pub location: Option<Location>,
}

/// Either a preformatted string or a structured address.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Location {
  Text(String),
  Structured {
    #[serde(default)]
    city:    Option<String>,
    #[serde(default)]
    state:   Option<String>,
    #[serde(default)]
    country: Option<String>,
  },
}

impl Location {
  fn display(self) -> Option<String> {
    let text = match self {
      Self::Text(t) => t.trim().to_owned(),
      Self::Structured { city, state, country } => [city, state, country]
        .into_iter()
        .flatten()
        .map(|p| p.trim().to_owned())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(", "),
    };
    Some(text).filter(|t| !t.is_empty())
  }
}

impl ProfileEnvelope {
  pub fn into_profile(self) -> AuthorProfile {
    AuthorProfile {
      name:     self.name.filter(|n| !n.trim().is_empty()),
      picture:  self.picture.as_ref().and_then(Picture::url).map(str::to_owned),
      location: self.location.and_then(Location::display),
    }
  }
}
