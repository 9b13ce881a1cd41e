//! Payroll sync server binary.
//!
//! Wires together configuration, backend selection, the shared state
//! store, the export scheduler, and the Axum sync server.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration (`payroll-config.yaml` + environment overrides)
//! 3. Select the storage backend per the configured mode
//! 4. Load the initial state into the authoritative store
//! 5. Spawn the export scheduler (when configured)
//! 6. Run the sync server until terminated
//!
//! Startup aborts with a nonzero exit when `STORAGE_MODE=postgres` and
//! the database is unreachable; under `auto` the server falls back to
//! file storage with a warning instead.

mod config;
mod error;
mod export;

use std::path::Path;
use std::sync::Arc;

use payroll_store::{StateStore, select_backend};
use payroll_sync::{AppState, ServerConfig, StaticAssets};
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt, reload};

use crate::config::AppConfig;
use crate::error::AppError;

/// Default configuration file path, relative to the working directory.
const CONFIG_FILE: &str = "payroll-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if any initialization step or the server itself
/// fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Structured logging comes up before anything that can fail, so
    // config-load errors are captured too. RUST_LOG wins; the filter is
    // reloaded from the config level once that is available.
    let (filter, filter_handle) = reload::Layer::new(
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    );
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .init();

    info!("payroll-server starting");

    let config = AppConfig::load(Path::new(CONFIG_FILE)).map_err(AppError::Config)?;
    if std::env::var_os("RUST_LOG").is_none()
        && let Err(e) = filter_handle.reload(EnvFilter::new(&config.logging.level))
    {
        warn!(error = %e, "Failed to apply configured log level");
    }

    info!(
        mode = ?config.storage.mode,
        data_dir = %config.storage.data_dir.display(),
        port = config.server.port,
        "Configuration loaded"
    );

    // Backend selection is evaluated exactly once; the chosen kind is
    // fixed for the process's lifetime.
    let postgres = config.storage.postgres_config();
    let backend = select_backend(
        config.storage.mode,
        &config.storage.data_dir,
        postgres.as_ref(),
    )
    .await
    .map_err(AppError::Storage)?;

    let store = StateStore::open(backend).await.map_err(AppError::Storage)?;
    info!(storage = store.kind().as_str(), "State storage initialized");

    let state = Arc::new(AppState::new(store));

    let _exporter = export::spawn_exporter(&config.export, Arc::clone(&state));

    let server_config = ServerConfig {
        host: config.server.host,
        port: config.server.port,
    };
    let assets = StaticAssets {
        root: config.server.static_root,
        index: config.server.index_file,
    };

    payroll_sync::start_server(&server_config, &assets, state)
        .await
        .map_err(AppError::Server)?;

    Ok(())
}
