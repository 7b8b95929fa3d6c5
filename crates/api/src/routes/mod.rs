pub mod health;
pub mod metrics;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /metrics          record, list, chart, get, delete
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/metrics", metrics::router())
}
