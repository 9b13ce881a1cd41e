//! Sync server for the payroll schedule.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **`WebSocket` endpoint** (`/ws`) where clients receive an initial
//!   snapshot and live `state:updated` / `presence:update` broadcasts
//!   via [`tokio::sync::broadcast`]
//! - **Health endpoint** (`GET /healthz`) reporting liveness and the
//!   active storage backend
//! - **Static assets** (`GET /` and everything else) served from a
//!   configurable root
//!
//! # Architecture
//!
//! Each connection runs its own task; all mutation of the
//! authoritative [`StateStore`](payroll_store::StateStore) is
//! serialized by one mutation mutex, and the accepted-update broadcast
//! is sent while that lock is still held. Every client therefore
//! observes updates in the exact order they were applied. Snapshots
//! read the store directly without the mutation mutex, so a hung
//! persistence call never blocks new connections. Clients that fall
//! behind the broadcast channel skip ahead to the newest message.

pub mod handlers;
pub mod router;
pub mod server;
pub mod state;
pub mod ws;

// Re-export primary types for convenience.
pub use router::{StaticAssets, build_router};
pub use server::{ServerConfig, ServerError, start_server};
pub use state::{AppState, ConnectionSet};
