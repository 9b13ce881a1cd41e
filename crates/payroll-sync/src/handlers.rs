//! HTTP endpoint handlers for the sync server.
//!
//! The HTTP surface is deliberately small: everything stateful happens
//! over the `WebSocket`. The only JSON endpoint is the health probe.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;

use crate::state::AppState;

/// Health probe reporting liveness and the active storage backend.
///
/// # Route
///
/// `GET /healthz` -- `{"ok": true, "storage": "file" | "postgres"}`
pub async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "ok": true,
        "storage": state.storage_kind(),
    }))
}
