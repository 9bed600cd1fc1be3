//! Process wiring for the clinic HTTP server: configuration, store startup
//! and the traced router.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use axum::Router;
use clinic_api::{ApiOptions, api_router};
use clinic_core::{appointment::TransitionPolicy, schedule::ClinicTimeZone, store::ClinicStore};
use clinic_store_sqlite::SqliteStore;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

/// Prefix for environment overrides, e.g. `CLINIC_PORT=9000`.
pub const ENV_PREFIX: &str = "CLINIC";

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and the
/// environment.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:                      String,
  pub port:                      u16,
  pub store_path:                PathBuf,
  /// Email of the profile promoted to admin when no admin exists yet.
  #[serde(default)]
  pub bootstrap_admin_email:     Option<String>,
  /// Fixed clinic offset from UTC. Host-local time when absent.
  #[serde(default)]
  pub clinic_utc_offset_minutes: Option<i32>,
  #[serde(default)]
  pub strict_transitions:        bool,
}

impl ServerConfig {
  /// Layer the optional TOML file at `path` under `CLINIC_*` variables.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix(ENV_PREFIX))
      .build()
      .context("failed to read config file")?;

    settings
      .try_deserialize()
      .context("failed to deserialise ServerConfig")
  }

  pub fn time_zone(&self) -> anyhow::Result<ClinicTimeZone> {
    ClinicTimeZone::from_utc_offset_minutes(self.clinic_utc_offset_minutes)
      .context("invalid clinic_utc_offset_minutes")
  }

  pub fn api_options(&self) -> ApiOptions {
    ApiOptions {
      transitions: if self.strict_transitions {
        TransitionPolicy::Strict
      } else {
        TransitionPolicy::Permissive
      },
    }
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

// ─── Startup ──────────────────────────────────────────────────────────────────

/// Open the SQLite store named by the config and apply the clinic settings.
pub async fn open_store(cfg: &ServerConfig) -> anyhow::Result<SqliteStore> {
  let store_path = expand_tilde(&cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;
  configure_store(store, cfg)
}

/// Apply the clinic time zone and the bootstrap admin email to `store`.
pub fn configure_store(store: SqliteStore, cfg: &ServerConfig) -> anyhow::Result<SqliteStore> {
  let store = store.with_time_zone(cfg.time_zone()?);
  Ok(match cfg.bootstrap_admin_email.as_deref() {
    Some(email) => store.with_bootstrap_admin(email),
    None => store,
  })
}

/// Promote the configured bootstrap admin if their profile already exists.
/// A no-op once an admin exists. Profiles created later are promoted on
/// sign-in by the store.
pub async fn bootstrap_admin<S>(store: &S, cfg: &ServerConfig) -> anyhow::Result<()>
where
  S: ClinicStore,
{
  let Some(email) = cfg.bootstrap_admin_email.as_deref() else {
    return Ok(());
  };
  let promoted = store
    .bootstrap_admin(email)
    .await
    .context("failed to bootstrap admin")?;
  if promoted.is_none() {
    tracing::debug!(email, "bootstrap admin deferred: admin exists or profile not created yet");
  }
  Ok(())
}

/// The API router with HTTP request tracing.
pub fn app<S>(store: Arc<S>, cfg: &ServerConfig) -> Router
where
  S: ClinicStore + 'static,
{
  api_router(store, cfg.api_options()).layer(TraceLayer::new_for_http())
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
