//! Error type for `memoir-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] memoir_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A column held a value the domain type cannot represent.
  #[error("corrupt column {column}: {value}")]
  Corrupt { column: &'static str, value: String },

  #[error("event not found: {0}")]
  EventNotFound(i64),

  #[error("photo not found: {0}")]
  PhotoNotFound(i64),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
