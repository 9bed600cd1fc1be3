//! clinic-server binary.
//!
//! Reads `config.toml` (or the path given with `--config`), layers `CLINIC_*`
//! environment overrides on top, opens the SQLite store and serves the
//! appointment API over HTTP.

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::Parser;
use clinic_server::{ServerConfig, app, bootstrap_admin, open_store};
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Clinic appointment server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
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
  let server_cfg = ServerConfig::load(&cli.config)?;

  let store = open_store(&server_cfg).await?;
  bootstrap_admin(&store, &server_cfg).await?;

  let app = app(Arc::new(store), &server_cfg);
  let address = server_cfg.address();

  tracing::info!(
    strict_transitions = server_cfg.strict_transitions,
    "Listening on http://{address}"
  );
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
