//! Gap-filled daily chart series.
//!
//! One storage call per request; bucketing and zero-fill are pure.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::aggregation::{date_sequence, days_in_range, latest_per_day};
use crate::error::CoreError;
use crate::metric::Metric;
use crate::store::MetricStore;
use crate::timezone::{parse_calendar_date, Timezone, TimezoneResolver, DATE_FORMAT};
use crate::types::EpochSeconds;
use crate::units::{self, MetricType, Unit, UnitId};

/// Largest inclusive day range a single chart request may span.
pub const DEFAULT_MAX_CHART_DAYS: i64 = 366;

/// Chart request as supplied by a caller.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChartQuery {
    #[validate(length(min = 1, max = 255, message = "must be 1 to 255 characters"))]
    pub user_id: String,
    #[serde(rename = "type")]
    pub metric_type: MetricType,
    /// `yyyy-MM-dd`, inclusive.
    #[validate(length(min = 1, message = "must not be empty"))]
    pub start_date: String,
    /// `yyyy-MM-dd`, inclusive.
    #[validate(length(min = 1, message = "must not be empty"))]
    pub end_date: String,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub timezone: String,
    /// Display unit; the base unit when absent.
    pub unit: Option<String>,
}

/// One day of the series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    /// Zone-local calendar date, `yyyy-MM-dd`.
    pub date: String,
    pub value: f64,
    pub unit: UnitId,
    /// Sample instant, or the start of the day when zero-filled.
    pub timestamp: EpochSeconds,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSeries {
    pub data: Vec<ChartPoint>,
    pub timezone: String,
    pub start_date: String,
    pub end_date: String,
}

/// Builds [`ChartSeries`] from the latest sample of each day.
#[derive(Clone)]
pub struct ChartBuilder {
    store: Arc<dyn MetricStore>,
    resolver: TimezoneResolver,
    max_days: i64,
}

impl ChartBuilder {
    pub fn new(store: Arc<dyn MetricStore>, resolver: TimezoneResolver) -> Self {
        Self {
            store,
            resolver,
            max_days: DEFAULT_MAX_CHART_DAYS,
        }
    }

    pub fn with_max_days(mut self, max_days: i64) -> Self {
        self.max_days = max_days;
        self
    }

    pub async fn build(&self, query: &ChartQuery) -> Result<ChartSeries, CoreError> {
        query.validate()?;

        let zone = Timezone::parse(&query.timezone)?;
        let unit = Unit::parse_or_base(query.unit.as_deref(), query.metric_type)?;
        let start = parse_calendar_date(&query.start_date)?;
        let end = parse_calendar_date(&query.end_date)?;

        // Resolving both bounds also confirms the zone exists.
        let range_start = self.resolver.start_of_day(start, &zone)?;
        let range_end = self.resolver.end_of_day(end, &zone)?;

        let days = days_in_range(start, end);
        if days > self.max_days {
            return Err(CoreError::Validation(format!(
                "Date range spans {days} days; at most {} allowed",
                self.max_days
            )));
        }

        let series = |data: Vec<ChartPoint>| ChartSeries {
            data,
            timezone: zone.as_str().to_string(),
            start_date: query.start_date.clone(),
            end_date: query.end_date.clone(),
        };

        if days == 0 {
            return Ok(series(Vec::new()));
        }

        let samples = self
            .store
            .find_by_user_type_and_time_range(
                &query.user_id,
                query.metric_type,
                range_start,
                range_end,
            )
            .await?;

        let buckets = latest_per_day(&samples, &zone, &self.resolver)?;

        tracing::debug!(
            user_id = %query.user_id,
            metric_type = %query.metric_type,
            timezone = %zone,
            days,
            samples = samples.len(),
            filled = buckets.len(),
            "Built chart buckets",
        );

        let data = date_sequence(start, end)
            .into_iter()
            .map(|date| self.point(date, buckets.get(&date).copied(), &unit, &zone))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(series(data))
    }

    fn point(
        &self,
        date: NaiveDate,
        sample: Option<&Metric>,
        unit: &Unit,
        zone: &Timezone,
    ) -> Result<ChartPoint, CoreError> {
        let (value, timestamp) = match sample {
            Some(m) => (units::to_display(unit, m.value), m.timestamp),
            None => (0.0, self.resolver.start_of_day(date, zone)?),
        };
        Ok(ChartPoint {
            date: date.format(DATE_FORMAT).to_string(),
            value,
            unit: unit.id(),
            timestamp,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
