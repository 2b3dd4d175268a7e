//! Photo bytes, as stored in a [`BlobStore`](crate::store::BlobStore) or
//! downloaded from the feed.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONTENT_TYPE: &str = "image/jpeg";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blob {
  pub bytes:        Bytes,
  pub content_type: String,
}

impl Blob {
  pub fn new(bytes: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
    Self { bytes: bytes.into(), content_type: content_type.into() }
  }

  /// File extension matching `content_type`, used when minting storage keys.
  pub fn extension(&self) -> &'static str {
    let essence = self
      .content_type
      .split(';')
      .next()
      .unwrap_or_default()
      .trim()
      .to_ascii_lowercase();
    match essence.as_str() {
      "image/png" => "png",
      "image/gif" => "gif",
      "image/webp" => "webp",
      _ => "jpg",
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn extension_follows_content_type() {
    assert_eq!(Blob::new(vec![], "image/png").extension(), "png");
    assert_eq!(Blob::new(vec![], "image/webp; q=1").extension(), "webp");
    assert_eq!(Blob::new(vec![], "IMAGE/GIF").extension(), "gif");
    assert_eq!(Blob::new(vec![], "image/jpeg").extension(), "jpg");
    assert_eq!(Blob::new(vec![], "application/octet-stream").extension(), "jpg");
  }
}
