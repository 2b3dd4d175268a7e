//! The `FeedSource` trait: everything the sync engine needs from upstream.

use std::future::Future;

use crate::{
  blob::Blob,
  post::{AuthorProfile, FeedPage},
};

/// Abstraction over the external social-feed API.
///
/// Implemented over HTTP by `memoir-feed`; tests use scripted fakes.
pub trait FeedSource: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Fetch one page of posts starting after `cursor` (or at the head of the
  /// feed when `None`). `limit` is clamped to the upstream maximum.
  ///
  /// Returns an empty page with no cursor once the feed is exhausted.
  fn fetch_page(
    &self,
    cursor: Option<String>,
    limit: u32,
  ) -> impl Future<Output = Result<FeedPage, Self::Error>> + Send + '_;

  /// Fetch the page owner's profile, used as fallback attribution.
  fn fetch_profile(
    &self,
  ) -> impl Future<Output = Result<AuthorProfile, Self::Error>> + Send + '_;

  /// Download the bytes behind an attachment image URL.
  fn fetch_media<'a>(
    &'a self,
    url: &'a str,
  ) -> impl Future<Output = Result<Blob, Self::Error>> + Send + 'a;
}
