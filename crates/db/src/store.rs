//! [`MetricStore`] adapter over PostgreSQL.

use async_trait::async_trait;
use mtrack_core::metric::Metric;
use mtrack_core::store::{MetricStore, StoreError};
use mtrack_core::types::{EpochSeconds, MetricId};
use mtrack_core::units::MetricType;

use crate::models::metric::MetricRow;
use crate::repositories::MetricRepo;
use crate::DbPool;

/// Serves the storage contract from the `metrics` table.
#[derive(Debug, Clone)]
pub struct PgMetricStore {
    pool: DbPool,
}

impl PgMetricStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

fn map_sqlx(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StoreError::Unavailable(err.to_string())
        }
        other => StoreError::Query(other.to_string()),
    }
}

fn into_metrics(rows: Vec<MetricRow>) -> Result<Vec<Metric>, StoreError> {
    rows.into_iter().map(Metric::try_from).collect()
}

#[async_trait]
impl MetricStore for PgMetricStore {
    async fn save(&self, metric: Metric) -> Result<Metric, StoreError> {
        let row = MetricRepo::insert(&self.pool, &metric)
            .await
            .map_err(map_sqlx)?;
        Metric::try_from(row)
    }

    async fn find_by_id(
        &self,
        id: MetricId,
        user_id: &str,
    ) -> Result<Option<Metric>, StoreError> {
        MetricRepo::find_by_id(&self.pool, id, user_id)
            .await
            .map_err(map_sqlx)?
            .map(Metric::try_from)
            .transpose()
    }

    async fn find_by_user_and_type(
        &self,
        user_id: &str,
        metric_type: MetricType,
    ) -> Result<Vec<Metric>, StoreError> {
        let rows = MetricRepo::list_by_user_and_type(&self.pool, user_id, metric_type)
            .await
            .map_err(map_sqlx)?;
        into_metrics(rows)
    }

    async fn find_by_user_type_and_time_range(
        &self,
        user_id: &str,
        metric_type: MetricType,
        start: EpochSeconds,
        end: EpochSeconds,
    ) -> Result<Vec<Metric>, StoreError> {
        let rows = MetricRepo::list_in_range(&self.pool, user_id, metric_type, start, end)
            .await
            .map_err(map_sqlx)?;
        into_metrics(rows)
    }

    async fn delete(&self, id: MetricId, user_id: &str) -> Result<bool, StoreError> {
        MetricRepo::delete(&self.pool, id, user_id)
            .await
            .map_err(map_sqlx)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        crate::health_check(&self.pool)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }
}
