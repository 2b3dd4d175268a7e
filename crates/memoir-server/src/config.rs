//! Runtime configuration, deserialised from `config.toml` layered under
//! `MEMOIR_*` environment variables.

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File};
use memoir_feed::FeedConfig;
use memoir_sync::{BatchRequest, DEFAULT_MAX_PAGES, SyncSettings};
use serde::Deserialize;

/// Top-level server configuration.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:               String,
  #[serde(default = "default_port")]
  pub port:               u16,
  pub store_path:         PathBuf,
  /// Origin photo URLs are minted under, e.g. `https://memoir.example.com`.
  pub public_base_url:    String,
  pub auth_username:      String,
  pub auth_password_hash: String,
  pub feed:               FeedConfig,
  #[serde(default)]
  pub sync:               SyncConfig,
}

/// Batch sizing and scheduling.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct SyncConfig {
  pub target_count:           u32,
  pub page_limit:             u32,
  pub max_pages:              u32,
  /// Seconds between scheduled runs; `0` disables the schedule.
  pub schedule_interval_secs: u64,
  pub external_source:        String,
}

impl Default for SyncConfig {
  fn default() -> Self {
    Self {
      target_count:           25,
      page_limit:             25,
      max_pages:              DEFAULT_MAX_PAGES,
      schedule_interval_secs: 3600,
      external_source:        "feed".to_owned(),
    }
  }
}

fn default_host() -> String { "127.0.0.1".to_owned() }

fn default_port() -> u16 { 8080 }

impl ServerConfig {
  /// Read `path` (optional) and overlay `MEMOIR_*` environment variables.
  ///
  /// Nested keys use a double underscore: `MEMOIR_FEED__ACCESS_TOKEN`.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    Config::builder()
      .add_source(File::from(path).required(false))
      .add_source(
        Environment::with_prefix("MEMOIR")
          .prefix_separator("_")
          .separator("__"),
      )
      .build()?
      .try_deserialize()
  }

  /// Engine settings derived from this configuration.
  pub fn sync_settings(&self) -> SyncSettings {
    SyncSettings {
      public_base_url: self.public_base_url.clone(),
      external_source: self.sync.external_source.clone(),
      max_pages:       self.sync.max_pages,
    }
  }
}

impl SyncConfig {
  /// A batch request from the configured defaults.
  pub fn request(&self, cursor: Option<String>, chain: bool) -> BatchRequest {
    BatchRequest {
      cursor,
      target_count: self.target_count,
      limit: self.page_limit,
      chain,
    }
  }
}

#[cfg(test)]
mod tests {
  use config::FileFormat;

  use super::*;

  fn parse(toml: &str) -> ServerConfig {
    Config::builder()
      .add_source(File::from_str(toml, FileFormat::Toml))
      .build()
      .unwrap()
      .try_deserialize()
      .unwrap()
  }

  const MINIMAL: &str = r#"
    store_path         = "~/.local/share/memoir/memoir.db"
    public_base_url    = "https://memoir.example.com"
    auth_username      = "admin"
    auth_password_hash = "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA"

    [feed]
    base_url     = "https://graph.example.com/v19.0/page-1"
    access_token = "token"
  "#;

  #[test]
  fn minimal_config_fills_defaults() {
    let cfg = parse(MINIMAL);
    assert_eq!(cfg.host, "127.0.0.1");
    assert_eq!(cfg.port, 8080);
    assert_eq!(cfg.sync, SyncConfig::default());
    assert_eq!(cfg.feed.max_page_size, 100);
    assert_eq!(cfg.feed.timeout_secs, 30);
  }

  #[test]
  fn sync_section_overrides_defaults() {
    let cfg = parse(&format!(
      "{MINIMAL}\n[sync]\ntarget_count = 50\nschedule_interval_secs = 0\n"
    ));
    assert_eq!(cfg.sync.target_count, 50);
    assert_eq!(cfg.sync.schedule_interval_secs, 0);
    assert_eq!(cfg.sync.page_limit, 25);
  }

  #[test]
  fn request_uses_configured_sizes() {
    let sync = SyncConfig { target_count: 7, page_limit: 3, ..Default::default() };
    let req = sync.request(Some("c".into()), true);
    assert_eq!(req.target_count, 7);
    assert_eq!(req.limit, 3);
    assert_eq!(req.cursor.as_deref(), Some("c"));
    assert!(req.chain);
  }

  #[test]
  fn settings_carry_public_base_url() {
    let cfg = parse(MINIMAL);
    let settings = cfg.sync_settings();
    assert_eq!(settings.public_base_url, "https://memoir.example.com");
    assert_eq!(settings.external_source, "feed");
    assert_eq!(settings.max_pages, DEFAULT_MAX_PAGES);
  }
}
