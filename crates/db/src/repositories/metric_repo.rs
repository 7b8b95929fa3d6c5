//! Repository for the `metrics` table.

use mtrack_core::metric::Metric;
use mtrack_core::types::{EpochSeconds, MetricId};
use mtrack_core::units::MetricType;
use sqlx::PgPool;

use crate::models::metric::MetricRow;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str =
    "id, user_id, metric_type, value, original_unit, epoch_seconds, created_at";

/// Provides persistence operations for metric samples.
pub struct MetricRepo;

impl MetricRepo {
    /// Insert a metric, returning the stored row.
    pub async fn insert(pool: &PgPool, metric: &Metric) -> Result<MetricRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO metrics \
                (id, user_id, metric_type, value, original_unit, epoch_seconds, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, MetricRow>(&query)
            .bind(metric.id)
            .bind(&metric.user_id)
            .bind(metric.metric_type.as_str())
            .bind(metric.value)
            .bind(metric.original_unit.as_str())
            .bind(metric.timestamp)
            .bind(metric.created_at)
            .fetch_one(pool)
            .await
    }

    /// Find a metric by ID, scoped to its owner.
    pub async fn find_by_id(
        pool: &PgPool,
        id: MetricId,
        user_id: &str,
    ) -> Result<Option<MetricRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM metrics WHERE id = $1 AND user_id = $2");
        sqlx::query_as::<_, MetricRow>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// All metrics of a type for a user, most recent first.
    pub async fn list_by_user_and_type(
        pool: &PgPool,
        user_id: &str,
        metric_type: MetricType,
    ) -> Result<Vec<MetricRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM metrics \
             WHERE user_id = $1 AND metric_type = $2 \
             ORDER BY epoch_seconds DESC, created_at DESC"
        );
        sqlx::query_as::<_, MetricRow>(&query)
            .bind(user_id)
            .bind(metric_type.as_str())
            .fetch_all(pool)
            .await
    }

    /// Metrics with `start <= epoch_seconds <= end`, oldest first.
    pub async fn list_in_range(
        pool: &PgPool,
        user_id: &str,
        metric_type: MetricType,
        start: EpochSeconds,
        end: EpochSeconds,
    ) -> Result<Vec<MetricRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM metrics \
             WHERE user_id = $1 AND metric_type = $2 \
               AND epoch_seconds BETWEEN $3 AND $4 \
             ORDER BY epoch_seconds ASC, created_at ASC"
        );
        sqlx::query_as::<_, MetricRow>(&query)
            .bind(user_id)
            .bind(metric_type.as_str())
            .bind(start)
            .bind(end)
            .fetch_all(pool)
            .await
    }

    /// Delete a metric owned by `user_id`. Returns true if a row was deleted.
    pub async fn delete(pool: &PgPool, id: MetricId, user_id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM metrics WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
