//! Route definitions for metrics, mounted at `/metrics`.

use axum::routing::get;
use axum::Router;

use crate::handlers::metrics;
use crate::state::AppState;

/// ```text
/// POST   /          -> create_metric
/// GET    /          -> list_metrics
/// GET    /chart     -> get_chart
/// GET    /{id}      -> get_metric
/// DELETE /{id}      -> delete_metric
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(metrics::list_metrics).post(metrics::create_metric))
        .route("/chart", get(metrics::get_chart))
        .route(
            "/{id}",
            get(metrics::get_metric).delete(metrics::delete_metric),
        )
}
