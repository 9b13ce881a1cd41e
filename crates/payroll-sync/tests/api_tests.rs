//! Integration tests for the HTTP surface of the sync server.
//!
//! Tests use Axum's `Router` directly via `tower::ServiceExt` without
//! starting a TCP server. This validates handler logic and routing
//! without needing a live network connection.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use payroll_store::{FileBackend, StateStore, StorageBackend};
use payroll_sync::router::{StaticAssets, build_router};
use payroll_sync::state::AppState;
use serde_json::Value;
use tower::ServiceExt;

async fn make_test_router(static_dir: &std::path::Path, data_dir: &std::path::Path) -> axum::Router {
    let store = StateStore::open(StorageBackend::File(FileBackend::new(data_dir)))
        .await
        .unwrap();
    let state = Arc::new(AppState::new(store));
    let assets = StaticAssets {
        root: static_dir.to_path_buf(),
        index: String::from("index.html"),
    };
    build_router(state, &assets)
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_healthz_reports_file_storage() {
    let dir = tempfile::tempdir().unwrap();
    let router = make_test_router(dir.path(), dir.path()).await;

    let response = router
        .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["ok"], true);
    assert_eq!(json["storage"], "file");
}

#[tokio::test]
async fn test_index_serves_static_document() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "<html>payroll</html>").unwrap();
    let router = make_test_router(dir.path(), dir.path()).await;

    let response = router
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"<html>payroll</html>");
}

#[tokio::test]
async fn test_other_paths_serve_static_assets() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("app.js"), "console.log('hi');").unwrap();
    let router = make_test_router(dir.path(), dir.path()).await;

    let response = router
        .oneshot(Request::get("/app.js").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_missing_asset_returns_404() {
    let dir = tempfile::tempdir().unwrap();
    let router = make_test_router(dir.path(), dir.path()).await;

    let response = router
        .oneshot(Request::get("/nope.css").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
