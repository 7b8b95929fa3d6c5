use std::sync::Arc;

use mtrack_core::service::MetricService;
use mtrack_core::store::MetricStore;
use mtrack_core::timezone::TimezoneResolver;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Metric use cases over the configured store.
    pub metrics: Arc<MetricService>,
    /// Storage backend, shared with the service; probed by `/health`.
    pub store: Arc<dyn MetricStore>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Wire the service over `store` using the IANA timezone database.
    pub fn new(store: Arc<dyn MetricStore>, config: ServerConfig) -> Self {
        let metrics = MetricService::new(Arc::clone(&store), TimezoneResolver::default())
            .with_max_chart_days(config.max_chart_days);

        Self {
            metrics: Arc::new(metrics),
            store,
            config: Arc::new(config),
        }
    }
}
