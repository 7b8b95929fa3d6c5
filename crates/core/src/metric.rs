//! The persisted metric record and its caller-facing view.

use serde::Serialize;

use crate::error::CoreError;
use crate::timezone::{Timezone, TimezoneResolver};
use crate::types::{EpochSeconds, MetricId, Timestamp};
use crate::units::{self, MetricType, Unit, UnitId};

/// Longest accepted user id, in characters.
pub const MAX_USER_ID_LEN: usize = 255;

/// A single measurement, stored in the base unit of its type.
///
/// Construct through [`Metric::new`] so the invariants hold for every value
/// in circulation; adapters that read rows back go through it as well.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metric {
    pub id: MetricId,
    pub user_id: String,
    pub metric_type: MetricType,
    /// Value in the base unit of `metric_type`. Never rounded.
    pub value: f64,
    /// Unit the value was recorded in.
    pub original_unit: UnitId,
    pub timestamp: EpochSeconds,
    pub created_at: Timestamp,
}

impl Metric {
    pub fn new(
        id: MetricId,
        user_id: String,
        metric_type: MetricType,
        value: f64,
        original_unit: UnitId,
        timestamp: EpochSeconds,
        created_at: Timestamp,
    ) -> Result<Self, CoreError> {
        if user_id.trim().is_empty() {
            return Err(CoreError::InvalidMetric("UserId is required".to_string()));
        }
        if user_id.chars().count() > MAX_USER_ID_LEN {
            return Err(CoreError::InvalidMetric(format!(
                "UserId must be at most {MAX_USER_ID_LEN} characters"
            )));
        }
        if !value.is_finite() {
            return Err(CoreError::InvalidMetric(format!(
                "Value must be a finite number (got {value})"
            )));
        }
        if value < 0.0 {
            return Err(CoreError::InvalidMetric(format!(
                "Value cannot be negative (got {value} {})",
                metric_type.base_unit()
            )));
        }
        if timestamp < 0 {
            return Err(CoreError::InvalidMetric(format!(
                "Timestamp must be valid (got {timestamp})"
            )));
        }
        Unit::new(original_unit, metric_type)?;

        Ok(Self {
            id,
            user_id,
            metric_type,
            value,
            original_unit,
            timestamp,
            created_at,
        })
    }

    pub fn belongs_to(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }

    /// `true` when `start <= timestamp <= end`.
    pub fn is_within_range(&self, start: EpochSeconds, end: EpochSeconds) -> bool {
        (start..=end).contains(&self.timestamp)
    }
}

/// A metric as returned to callers: value in a display unit, date rendered
/// in a zone.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricView {
    pub id: MetricId,
    pub user_id: String,
    #[serde(rename = "type")]
    pub metric_type: MetricType,
    pub value: f64,
    pub unit: UnitId,
    pub original_unit: UnitId,
    pub timestamp: EpochSeconds,
    pub date: String,
    pub created_at: Timestamp,
}

impl MetricView {
    /// Present `metric` in `display` with its date rendered in `zone`.
    pub fn render(
        metric: &Metric,
        display: &Unit,
        zone: &Timezone,
        resolver: &TimezoneResolver,
    ) -> Result<Self, CoreError> {
        Ok(Self {
            id: metric.id,
            user_id: metric.user_id.clone(),
            metric_type: metric.metric_type,
            value: units::to_display(display, metric.value),
            unit: display.id(),
            original_unit: metric.original_unit,
            timestamp: metric.timestamp,
            date: resolver.format_default(metric.timestamp, zone)?,
            created_at: metric.created_at,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
