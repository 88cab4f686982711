//! ProCheck server binary.
//!
//! Reads `procheck.toml` (or the path given with `--config`) layered under
//! `PROCHECK_*` environment variables, opens the SQLite guest store and
//! serves the registration API plus the bundled front-end.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use procheck_server::{
  AppState, Environment, ServerConfig,
  auth::SharedSecret,
  config::StoreLocation,
  shutdown::{self, Outcome},
};
use procheck_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "ProCheck guest registration server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "procheck.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  let cli = Cli::parse();

  let server_cfg = ServerConfig::load(&cli.config)
    .with_context(|| format!("failed to load configuration from {:?}", cli.config))?;

  // Initialise tracing. Development logs at debug unless RUST_LOG says
  // otherwise.
  let default_level = match server_cfg.environment {
    Environment::Development => LevelFilter::DEBUG,
    _ => LevelFilter::INFO,
  };
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy(),
    )
    .init();

  install_panic_hook();

  let store = open_store(&server_cfg).await?;

  let auth = Arc::new(SharedSecret::new(server_cfg.admin_token.as_deref()));
  if server_cfg.admin_token.as_deref().is_none_or(str::is_empty) {
    tracing::warn!("no admin token configured; the guest listing is disabled");
  }

  let grace = server_cfg.shutdown_grace();
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);
  let environment = server_cfg.environment;

  let state = AppState::new(store.clone(), server_cfg, auth);
  let app = procheck_server::router(state);

  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  tracing::info!("ProCheck server listening on http://{address}");
  tracing::info!(%environment, "environment");
  tracing::info!("health check at http://{address}/api/health");

  let outcome = shutdown::serve_until(listener, app, shutdown::shutdown_signal(), grace)
    .await
    .context("server error")?;

  if let Err(e) = store.close().await {
    tracing::error!(error = %e, "failed to close guest store");
  }

  match outcome {
    Outcome::Drained => {
      tracing::info!("server shut down cleanly");
      Ok(())
    }
    Outcome::TimedOut => {
      tracing::error!(?grace, "in-flight requests did not finish in time; forcing exit");
      std::process::exit(1);
    }
  }
}

async fn open_store(cfg: &ServerConfig) -> anyhow::Result<SqliteStore> {
  match cfg.store_location() {
    StoreLocation::Memory => {
      tracing::warn!("using an in-memory guest store; registrations will not survive a restart");
      SqliteStore::open_in_memory()
        .await
        .context("failed to open in-memory store")
    }
    StoreLocation::File(path) => {
      let path = expand_tilde(&path);
      if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
          .with_context(|| format!("failed to create {parent:?}"))?;
      }
      let store = SqliteStore::open(&path)
        .await
        .with_context(|| format!("failed to open store at {path:?}"))?;
      tracing::info!(?path, "guest store opened");
      Ok(store)
    }
  }
}

/// Route panics outside request handling through tracing as well.
fn install_panic_hook() {
  let default_hook = std::panic::take_hook();
  std::panic::set_hook(Box::new(move |info| {
    tracing::error!(%info, "panic");
    default_hook(info);
  }));
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
