#![allow(dead_code)]

use std::path::Path;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tabula_core::persist::{FileStore, KeyValueStore, MemoryStore};
use tabula_core::session::TableSession;
use tower::ServiceExt;

use tabula_api::config::{ServerConfig, DEFAULT_IMPORT_MAX_BYTES};
use tabula_api::router::build_app_router;
use tabula_api::state::AppState;

/// Build a test `ServerConfig` with safe defaults.
///
/// Uses `http://localhost:5173` as CORS origin (matching the dev default),
/// a 30-second request timeout and in-memory schema storage.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        state_dir: None,
        default_page_size: 10,
        export_filename: "table-data.csv".to_string(),
        import_max_bytes: DEFAULT_IMPORT_MAX_BYTES,
    }
}

/// Router plus the state behind it, for tests that reach into the session.
pub fn build_test_app_with(config: ServerConfig) -> (Router, AppState) {
    let session = TableSession::load(Box::new(MemoryStore::new()), config.default_page_size).unwrap();
    let state = AppState::new(session, config.clone());
    (build_app_router(state.clone(), &config), state)
}

fn app_with_storage(storage: Box<dyn KeyValueStore>) -> Router {
    let config = test_config();
    let session = TableSession::load(storage, config.default_page_size).unwrap();
    let state = AppState::new(session, config.clone());
    build_app_router(state, &config)
}

/// Full application router over a fresh seeded session with in-memory
/// schema storage. Uses the same middleware stack as `main.rs`.
pub fn build_test_app() -> Router {
    app_with_storage(Box::new(MemoryStore::new()))
}

/// Same as [`build_test_app`] but persisting the schema under `dir`.
pub fn build_test_app_in(dir: &Path) -> Router {
    app_with_storage(Box::new(FileStore::open(dir).unwrap()))
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

pub async fn get(app: &Router, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

pub async fn delete(app: &Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn post_empty(app: &Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

async fn with_json(app: &Router, method: Method, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn post_json(app: &Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    with_json(app, Method::POST, uri, body).await
}

pub async fn put_json(app: &Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    with_json(app, Method::PUT, uri, body).await
}

pub async fn patch_json(app: &Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    with_json(app, Method::PATCH, uri, body).await
}

pub async fn post_csv(app: &Router, uri: &str, csv: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "text/csv")
        .body(Body::from(csv.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let text = body_text(response).await;
    serde_json::from_str(&text).unwrap()
}
