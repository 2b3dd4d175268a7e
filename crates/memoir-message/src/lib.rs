//! Message structurer for memoir.
//!
//! Turns one upstream post into the normalized pieces an event row needs.
//!
//! Pipeline:
//!   Post
//!     ├─ attachments::primary()      → richest attachment, if any
//!     ├─ structure()                 → ParsedMessage { title, description, .. }
//!     │    └─ split_headline()       → Headline { line_1, line_2 }
//!     └─ attachments::photo_urls()   → ordered image source URLs
//!
//! Everything here is pure: no I/O, no allocation beyond the outputs.

pub mod attachments;
pub mod headline;
pub mod source_url;
pub mod structure;

pub use headline::{Headline, split_headline};
pub use source_url::normalize_source_url;
pub use structure::{ParsedMessage, structure};
