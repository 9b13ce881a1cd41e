//! Top-level error type for the payroll server binary.

use payroll_store::StoreError;
use payroll_sync::ServerError;

use crate::config::ConfigError;

/// Errors that abort server startup.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Storage initialization failed. Under `postgres` mode this is
    /// the required-durability hard failure.
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),

    /// The HTTP server failed to bind or serve.
    #[error("server error: {0}")]
    Server(#[from] ServerError),
}
