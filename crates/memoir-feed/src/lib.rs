//! HTTP client for the external social-feed API.
//!
//! [`FeedClient`] implements [`memoir_core::feed::FeedSource`]: cursor-based
//! page fetches with an explicit field selection, the page owner's profile,
//! and raw downloads of attachment images.

mod client;
mod wire;

pub mod error;

pub use client::{FeedClient, FeedConfig, POST_FIELDS};
pub use error::{Error, Result};
