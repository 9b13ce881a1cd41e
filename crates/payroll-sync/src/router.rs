//! Axum router construction for the sync server.
//!
//! Assembles the `WebSocket` route, health probe, and static asset
//! serving into a single [`Router`] with CORS middleware enabled so the
//! payroll page can be hosted cross-origin during development.

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Location of the static client assets.
#[derive(Debug, Clone)]
pub struct StaticAssets {
    /// Directory holding all static files.
    pub root: PathBuf,
    /// Document served at `GET /`, relative to `root`.
    pub index: String,
}

impl Default for StaticAssets {
    fn default() -> Self {
        Self {
            root: PathBuf::from("public"),
            index: String::from("index.html"),
        }
    }
}

/// Build the complete Axum router for the sync server.
///
/// The router includes:
/// - `GET /` -- the static payroll document
/// - `GET /healthz` -- liveness + active storage kind
/// - `GET /ws` -- the `WebSocket` sync protocol
/// - everything else -- static assets from the configured root
pub fn build_router(state: Arc<AppState>, assets: &StaticAssets) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route_service("/", ServeFile::new(assets.root.join(&assets.index)))
        .route("/healthz", get(handlers::healthz))
        .route("/ws", get(ws::ws_sync))
        .fallback_service(ServeDir::new(&assets.root))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
