//! Core types and trait definitions for the memoir ingestion engine.
//!
//! No HTTP or database dependencies live here. The crate
//! holds the normalized data model (events and photos), the upstream feed
//! wire model, and the collaborator traits the sync engine is generic over.

pub mod blob;
pub mod error;
pub mod event;
pub mod feed;
pub mod photo;
pub mod post;
pub mod store;

pub use error::{Error, Result};
