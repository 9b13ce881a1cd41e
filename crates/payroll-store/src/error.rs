//! Error types for the storage layer.
//!
//! All errors are propagated via [`StoreError`] which wraps the
//! underlying [`sqlx`] and I/O errors. Load-time corruption is not an
//! error at this level: both backends substitute the empty default
//! state and log instead of failing the process.

/// Errors that can occur in the storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A `PostgreSQL` operation failed.
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    /// A file I/O operation failed.
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A serialization or deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}
