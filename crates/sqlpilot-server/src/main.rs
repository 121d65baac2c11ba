//! sqlpilot server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) layered with
//! `SQLPILOT_*` environment variables, opens the SQLite store and serves the
//! JSON API over HTTP.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use sqlpilot_engine::HttpEngine;
use sqlpilot_server::{AppState, ServerConfig, session::SessionKeys};
use sqlpilot_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "SQLPilot data-access server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("SQLPILOT").try_parsing(true))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  // Expand `~` in store path and make sure its directory exists.
  let store_path = expand_tilde(&server_cfg.store_path);
  if let Some(parent) = store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {parent:?}"))?;
  }

  // Open SQLite store.
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  // Client of the query/generation service.
  let engine = HttpEngine::new(server_cfg.engine_url.clone())
    .context("failed to build query engine client")?;

  // Session signing keys.
  let session = SessionKeys::new(
    server_cfg.session_secret.as_bytes(),
    server_cfg.session_ttl_hours,
  )
  .context("invalid session settings")?;

  if server_cfg.oauth_shared_secret.is_none() {
    tracing::info!("oauth_shared_secret unset; OAuth sign-in disabled");
  }

  // Build application state.
  let state = AppState {
    store:   Arc::new(store),
    engine:  Arc::new(engine),
    session: Arc::new(session),
    config:  Arc::new(server_cfg.clone()),
  };

  let app = sqlpilot_server::router(state);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!(engine = %server_cfg.engine_url, "Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
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
