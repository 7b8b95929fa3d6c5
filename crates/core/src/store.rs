//! Storage port for metric records, plus an in-memory adapter.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::metric::Metric;
use crate::types::{EpochSeconds, MetricId};
use crate::units::MetricType;

/// Failures raised by storage adapters. Opaque to the core; never retried.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("storage query failed: {0}")]
    Query(String),

    #[error("stored record is invalid: {0}")]
    InvalidRecord(String),
}

/// Read/write contract the aggregation engine depends on.
#[async_trait]
pub trait MetricStore: Send + Sync {
    /// Persist `metric` and return the stored record.
    async fn save(&self, metric: Metric) -> Result<Metric, StoreError>;

    /// Look up a metric owned by `user_id`.
    async fn find_by_id(&self, id: MetricId, user_id: &str)
        -> Result<Option<Metric>, StoreError>;

    /// All metrics of `metric_type` for `user_id`, most recent first.
    async fn find_by_user_and_type(
        &self,
        user_id: &str,
        metric_type: MetricType,
    ) -> Result<Vec<Metric>, StoreError>;

    /// Metrics with `start <= timestamp <= end`. Order is unspecified.
    async fn find_by_user_type_and_time_range(
        &self,
        user_id: &str,
        metric_type: MetricType,
        start: EpochSeconds,
        end: EpochSeconds,
    ) -> Result<Vec<Metric>, StoreError>;

    /// Delete a metric owned by `user_id`. Returns whether a row was removed.
    async fn delete(&self, id: MetricId, user_id: &str) -> Result<bool, StoreError>;

    /// Cheap liveness probe.
    async fn health_check(&self) -> Result<(), StoreError>;
}

/// Process-local store. Contents are lost on restart.
#[derive(Debug, Default)]
pub struct InMemoryMetricStore {
    metrics: RwLock<Vec<Metric>>,
}

impl InMemoryMetricStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-built records, e.g. fixtures.
    pub fn with_metrics(metrics: Vec<Metric>) -> Self {
        Self {
            metrics: RwLock::new(metrics),
        }
    }

    pub async fn len(&self) -> usize {
        self.metrics.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.metrics.read().await.is_empty()
    }
}

#[async_trait]
impl MetricStore for InMemoryMetricStore {
    async fn save(&self, metric: Metric) -> Result<Metric, StoreError> {
        let mut metrics = self.metrics.write().await;
        metrics.retain(|m| m.id != metric.id);
        metrics.push(metric.clone());
        Ok(metric)
    }

    async fn find_by_id(
        &self,
        id: MetricId,
        user_id: &str,
    ) -> Result<Option<Metric>, StoreError> {
        let metrics = self.metrics.read().await;
        Ok(metrics
            .iter()
            .find(|m| m.id == id && m.belongs_to(user_id))
            .cloned())
    }

    async fn find_by_user_and_type(
        &self,
        user_id: &str,
        metric_type: MetricType,
    ) -> Result<Vec<Metric>, StoreError> {
        let metrics = self.metrics.read().await;
        let mut found: Vec<Metric> = metrics
            .iter()
            .filter(|m| m.belongs_to(user_id) && m.metric_type == metric_type)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(found)
    }

    async fn find_by_user_type_and_time_range(
        &self,
        user_id: &str,
        metric_type: MetricType,
        start: EpochSeconds,
        end: EpochSeconds,
    ) -> Result<Vec<Metric>, StoreError> {
        let metrics = self.metrics.read().await;
        let mut found: Vec<Metric> = metrics
            .iter()
            .filter(|m| {
                m.belongs_to(user_id)
                    && m.metric_type == metric_type
                    && m.is_within_range(start, end)
            })
            .cloned()
            .collect();
        found.sort_by_key(|m| m.timestamp);
        Ok(found)
    }

    async fn delete(&self, id: MetricId, user_id: &str) -> Result<bool, StoreError> {
        let mut metrics = self.metrics.write().await;
        let before = metrics.len();
        metrics.retain(|m| !(m.id == id && m.belongs_to(user_id)));
        Ok(metrics.len() < before)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
