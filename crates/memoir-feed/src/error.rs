//! Error type for `memoir-feed`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// Any non-success response from the feed API. Fatal for the current batch.
  #[error("feed unavailable: upstream returned {status}: {body}")]
  FeedUnavailable { status: u16, body: String },

  /// Non-success response while downloading an attachment image.
  #[error("media fetch failed for {url}: upstream returned {status}")]
  MediaUnavailable { url: String, status: u16 },

  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
