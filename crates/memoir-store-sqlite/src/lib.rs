//! SQLite backend for the memoir event store and blob store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. One [`SqliteStore`] implements both
//! [`EventStore`](memoir_core::store::EventStore) and
//! [`BlobStore`](memoir_core::store::BlobStore); photo bytes live in their own
//! table next to the rows that reference them.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
