use thiserror::Error;

/// A collaborator error with its concrete type erased at the crate boundary.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum Error {
  /// The feed could not be paged. Fatal for the current batch.
  #[error("feed unavailable: {0}")]
  FeedUnavailable(#[source] BoxError),

  /// One photo could not be downloaded or written to the blob store.
  /// Logged and skipped; the URL is retried on the next reconciliation.
  #[error("failed to fetch or store photo {url}: {source}")]
  PhotoFetchFailed {
    url:    String,
    #[source]
    source: BoxError,
  },

  /// An event or photo row could not be written. Fatal for one post.
  #[error("store write failed: {0}")]
  StoreWriteFailed(#[source] BoxError),

  /// A read against the store failed outside of a per-post unit of work.
  #[error("store unavailable: {0}")]
  StoreUnavailable(#[source] BoxError),
}

impl Error {
  pub(crate) fn feed<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::FeedUnavailable(Box::new(e))
  }

  pub(crate) fn store_write<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::StoreWriteFailed(Box::new(e))
  }

  pub(crate) fn store_read<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::StoreUnavailable(Box::new(e))
  }

  pub(crate) fn photo<E>(url: &str, e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::PhotoFetchFailed { url: url.to_owned(), source: Box::new(e) }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
