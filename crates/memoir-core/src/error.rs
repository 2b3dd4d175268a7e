//! Error types for `memoir-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown event origin: {0:?}")]
  UnknownOrigin(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
