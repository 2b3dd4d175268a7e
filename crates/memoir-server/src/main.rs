//! memoir binary.
//!
//! Reads `config.toml` (or the path given with `--config`), opens the SQLite
//! store, and either serves the HTTP triggers with the scheduled sync running
//! beside them, or runs a single `sync` / `dedupe` and prints its summary.
//!
//! # Password hash generation
//!
//! To generate the argon2 PHC string for `auth_password_hash`:
//!
//! ```text
//! cargo run -p memoir-server -- --hash-password
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use memoir_feed::FeedClient;
use memoir_server::{AppState, ServerConfig, auth, schedule};
use memoir_store_sqlite::SqliteStore;
use memoir_sync::{ContinuationQueue, Engine, spawn_continuation_worker};
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

type AppEngine = Engine<SqliteStore, SqliteStore, FeedClient>;

#[derive(Parser)]
#[command(author, version, about = "Social feed ingestion and reconciliation")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml", env = "MEMOIR_CONFIG", global = true)]
  config: PathBuf,

  /// Print the argon2 hash for a password entered on stdin and exit.
  #[arg(long)]
  hash_password: bool,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the HTTP triggers and run the scheduled sync (default).
  Serve,
  /// Run one batch and print its summary.
  Sync {
    /// Resume from this feed cursor instead of the head.
    #[arg(long)]
    cursor: Option<String>,
    /// Page size asked of the feed.
    #[arg(long)]
    limit:  Option<u32>,
    /// Stop after this many posts were reconciled.
    #[arg(long)]
    target: Option<u32>,
    /// Keep running batches until the feed is exhausted.
    #[arg(long)]
    chain:  bool,
  },
  /// Remove duplicate events and photos, then print the counts.
  Dedupe,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  if cli.hash_password {
    let password = read_password()?;
    let hash =
      auth::hash_password(&password).map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?;
    println!("{hash}");
    return Ok(());
  }

  let server_cfg = ServerConfig::load(&cli.config)
    .with_context(|| format!("failed to load config from {:?}", cli.config))?;

  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;
  let store = Arc::new(store);

  let feed = FeedClient::new(server_cfg.feed.clone()).context("failed to build feed client")?;

  let engine = Engine::new(
    Arc::clone(&store),
    store,
    Arc::new(feed),
    server_cfg.sync_settings(),
  );

  match cli.command.unwrap_or(Command::Serve) {
    Command::Serve => serve(engine, server_cfg).await,
    Command::Sync { cursor, limit, target, chain } => {
      let mut request = server_cfg.sync.request(cursor, false);
      request.limit = limit.unwrap_or(request.limit);
      request.target_count = target.unwrap_or(request.target_count);
      run_sync(&engine, request, chain).await
    }
    Command::Dedupe => {
      let summary = engine.dedupe().await.context("dedupe failed")?;
      println!("{}", serde_json::to_string_pretty(&summary)?);
      Ok(())
    }
  }
}

async fn serve(engine: AppEngine, server_cfg: ServerConfig) -> anyhow::Result<()> {
  let (queue, rx) = ContinuationQueue::channel();
  let engine = engine.with_continuation(queue);
  spawn_continuation_worker(engine.clone(), rx);

  if server_cfg.sync.schedule_interval_secs > 0 {
    schedule::spawn_scheduled_sync(
      engine.clone(),
      server_cfg.sync.request(None, true),
      Duration::from_secs(server_cfg.sync.schedule_interval_secs),
    );
  } else {
    tracing::info!("scheduled sync disabled");
  }

  let state = AppState {
    engine,
    sync: Arc::new(server_cfg.sync.clone()),
    auth: Arc::new(auth::AuthConfig {
      username:      server_cfg.auth_username.clone(),
      password_hash: server_cfg.auth_password_hash.clone(),
    }),
  };

  let app = memoir_server::router(state);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Run batches in the foreground; with `chain`, follow the cursor until the
/// feed reports no more work.
async fn run_sync(
  engine: &AppEngine,
  mut request: memoir_sync::BatchRequest,
  chain: bool,
) -> anyhow::Result<()> {
  loop {
    let summary = engine.run_batch(request.clone()).await.context("sync failed")?;
    println!("{}", serde_json::to_string_pretty(&summary)?);

    if !(chain && summary.has_more) {
      return Ok(());
    }
    request.cursor = summary.next_cursor;
  }
}

/// Read a password from stdin.
fn read_password() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(line.trim_end_matches(['\n', '\r']).to_owned())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
