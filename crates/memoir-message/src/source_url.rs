//! Source-URL normalization, the identity key for photo dedup.
//!
//! CDN image URLs carry signed, expiring query strings, so the same image is
//! served under a different URL on every fetch. Dropping the query and
//! fragment gives a stable key.

use url::Url;

pub fn normalize_source_url(raw: &str) -> String {
  let raw = raw.trim();
  match Url::parse(raw) {
    Ok(mut url) => {
      url.set_query(None);
      url.set_fragment(None);
      url.to_string()
    }
    Err(_) => raw
      .split(['?', '#'])
      .next()
      .unwrap_or_default()
      .to_owned(),
  }
}
