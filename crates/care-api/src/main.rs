//! care-server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens an
//! in-process SQLite store, and serves the pastoral care API over HTTP.
//!
//! ```toml
//! host = "127.0.0.1"
//! port = 8080
//! store_path = "~/.local/share/care/care.db"
//! hide_inactive_by_default = true
//! anonymous = "view"
//!
//! [[grants]]
//! person_id = "6f1c2a4e-0d8b-4a9e-9f3e-2b7d1c5e8a10"
//! capability = "administrate"
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use care_api::{AppState, ServerConfig};
use care_store_sqlite::SqliteStore;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Pastoral care API server")]
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
    .add_source(config::Environment::with_prefix("CARE"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  // Expand `~` in store path.
  let store_path = expand_tilde(&server_cfg.store_path);

  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let address = format!("{}:{}", server_cfg.host, server_cfg.port);
  tracing::info!(
    grants = server_cfg.grants.len(),
    hide_inactive_by_default = server_cfg.hide_inactive_by_default,
    "configuration loaded"
  );

  let app = care_api::router(AppState::new(store, server_cfg));

  tracing::info!("Listening on http://{address}");
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
