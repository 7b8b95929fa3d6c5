#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use mtrack_api::config::ServerConfig;
use mtrack_api::router::build_app_router;
use mtrack_api::state::AppState;
use mtrack_core::store::{InMemoryMetricStore, MetricStore};
use tower::ServiceExt;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        max_chart_days: 366,
        database_url: None,
        db_max_connections: 1,
    }
}

/// Build the full application router over `store`, with the same
/// middleware stack production uses.
pub fn build_test_app_with(store: Arc<dyn MetricStore>, config: ServerConfig) -> Router {
    let state = AppState::new(store, config.clone());
    build_app_router(state, &config)
}

/// Build the application over a fresh in-memory store.
pub fn build_test_app() -> Router {
    build_test_app_with(Arc::new(InMemoryMetricStore::new()), test_config())
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, Body::empty()).await
}

pub async fn delete(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, Body::empty()).await
}

pub async fn post_json(app: Router, uri: &str, json: serde_json::Value) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(json.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

async fn send(app: Router, method: Method, uri: &str, body: Body) -> Response<Body> {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(body)
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
