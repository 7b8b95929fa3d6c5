//! Use cases exposed to transport layers.
//!
//! Every read issues at most one storage call.

use std::sync::Arc;

use serde::Deserialize;
use validator::Validate;

use crate::chart::{ChartBuilder, ChartQuery, ChartSeries};
use crate::error::CoreError;
use crate::metric::{MetricView, MAX_USER_ID_LEN};
use crate::recorder::{MetricRecorder, NewMetric, PreparedMetric};
use crate::store::MetricStore;
use crate::timezone::{Timezone, TimezoneResolver};
use crate::types::MetricId;
use crate::units::{MetricType, Unit};

/// Filter for listing a user's metrics of one type.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    #[validate(length(min = 1, max = 255, message = "must be 1 to 255 characters"))]
    pub user_id: String,
    #[serde(rename = "type")]
    pub metric_type: MetricType,
    pub unit: Option<String>,
    /// Zone for the rendered `date`; `UTC` when absent.
    pub timezone: Option<String>,
}

/// Presentation options for a single-metric lookup.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MetricLookup {
    #[validate(length(min = 1, max = 255, message = "must be 1 to 255 characters"))]
    pub user_id: String,
    pub unit: Option<String>,
    pub timezone: Option<String>,
}

#[derive(Clone)]
pub struct MetricService {
    store: Arc<dyn MetricStore>,
    resolver: TimezoneResolver,
    recorder: MetricRecorder,
    charts: ChartBuilder,
}

impl MetricService {
    pub fn new(store: Arc<dyn MetricStore>, resolver: TimezoneResolver) -> Self {
        Self {
            recorder: MetricRecorder::new(resolver.clone()),
            charts: ChartBuilder::new(Arc::clone(&store), resolver.clone()),
            store,
            resolver,
        }
    }

    /// Service over `store` with the IANA database.
    pub fn with_store(store: Arc<dyn MetricStore>) -> Self {
        Self::new(store, TimezoneResolver::default())
    }

    pub fn with_max_chart_days(mut self, max_days: i64) -> Self {
        self.charts = self.charts.with_max_days(max_days);
        self
    }

    /// Record a reading and return it in the unit and zone it was given in.
    pub async fn add_metric(&self, input: NewMetric) -> Result<MetricView, CoreError> {
        let PreparedMetric { metric, unit, zone } = self.recorder.prepare(&input)?;
        let saved = self.store.save(metric).await?;

        tracing::info!(
            metric_id = %saved.id,
            user_id = %saved.user_id,
            metric_type = %saved.metric_type,
            timestamp = saved.timestamp,
            "Metric recorded",
        );

        MetricView::render(&saved, &unit, &zone, &self.resolver)
    }

    /// All metrics of a type for a user, most recent first.
    pub async fn list_metrics(&self, query: ListQuery) -> Result<Vec<MetricView>, CoreError> {
        query.validate()?;
        let unit = Unit::parse_or_base(query.unit.as_deref(), query.metric_type)?;
        let zone = zone_or_utc(query.timezone.as_deref())?;

        let metrics = self
            .store
            .find_by_user_and_type(&query.user_id, query.metric_type)
            .await?;

        tracing::debug!(
            user_id = %query.user_id,
            metric_type = %query.metric_type,
            unit = %unit.id(),
            count = metrics.len(),
            "Listing metrics",
        );

        metrics
            .iter()
            .map(|m| MetricView::render(m, &unit, &zone, &self.resolver))
            .collect()
    }

    pub async fn chart(&self, query: ChartQuery) -> Result<ChartSeries, CoreError> {
        self.charts.build(&query).await
    }

    /// A single metric owned by `lookup.user_id`.
    pub async fn get_metric(
        &self,
        id: MetricId,
        lookup: MetricLookup,
    ) -> Result<MetricView, CoreError> {
        lookup.validate()?;
        let zone = zone_or_utc(lookup.timezone.as_deref())?;

        let metric = self
            .store
            .find_by_id(id, &lookup.user_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Metric",
                id,
            })?;

        let unit = Unit::parse_or_base(lookup.unit.as_deref(), metric.metric_type)?;
        MetricView::render(&metric, &unit, &zone, &self.resolver)
    }

    pub async fn delete_metric(&self, id: MetricId, user_id: &str) -> Result<(), CoreError> {
        if user_id.trim().is_empty() || user_id.chars().count() > MAX_USER_ID_LEN {
            return Err(CoreError::Validation(format!(
                "user_id must be 1 to {MAX_USER_ID_LEN} characters"
            )));
        }

        if !self.store.delete(id, user_id).await? {
            return Err(CoreError::NotFound {
                entity: "Metric",
                id,
            });
        }

        tracing::info!(metric_id = %id, user_id = %user_id, "Metric deleted");
        Ok(())
    }
}

impl std::fmt::Debug for MetricService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricService").finish_non_exhaustive()
    }
}

fn zone_or_utc(identifier: Option<&str>) -> Result<Timezone, CoreError> {
    match identifier {
        Some(id) => Timezone::parse(id),
        None => Ok(Timezone::utc()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
