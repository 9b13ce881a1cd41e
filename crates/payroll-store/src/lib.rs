//! Storage layer for the payroll sync server.
//!
//! Persistence runs transparently against one of two backends sharing a
//! single contract: load and save one JSON payroll document.
//!
//! ```text
//! StateStore (authoritative in-memory state, single mutation point)
//!     |
//!     +-- StorageBackend::Postgres --> single-row payroll_state table
//!     +-- StorageBackend::File -----> payroll-state.json in DATA_DIR
//! ```
//!
//! The backend is chosen once at startup by [`select_backend`] and
//! never re-evaluated: `postgres` mode fails fatally when the database
//! is unreachable, `auto` mode falls back to the file backend with a
//! warning, `file` mode skips the database entirely.
//!
//! # Modules
//!
//! - [`file`] -- file-backed persistence
//! - [`postgres`] -- `PostgreSQL` single-row persistence
//! - [`select`] -- backend dispatch and startup selection policy
//! - [`state_store`] -- the authoritative in-memory state
//! - [`error`] -- shared error types

pub mod error;
pub mod file;
pub mod postgres;
pub mod select;
pub mod state_store;

// Re-export primary types for convenience.
pub use error::StoreError;
pub use file::FileBackend;
pub use postgres::{PostgresBackend, PostgresConfig};
pub use select::{StorageBackend, StorageKind, StorageMode, select_backend};
pub use state_store::{StateStore, UpdateOutcome};
