//! Turns an incoming reading into a storable [`Metric`].

use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::error::CoreError;
use crate::metric::Metric;
use crate::timezone::{Timezone, TimezoneResolver};
use crate::units::{self, MetricType, Unit};

/// Base values this close below zero are float noise at absolute zero.
const ZERO_NOISE: f64 = 1e-9;

/// A reading as supplied by a caller.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewMetric {
    #[validate(length(min = 1, max = 255, message = "must be 1 to 255 characters"))]
    pub user_id: String,
    #[serde(rename = "type")]
    pub metric_type: MetricType,
    pub value: f64,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub unit: String,
    /// ISO-8601 instant or `yyyy-MM-dd HH:mm:ss` wall-clock time.
    #[validate(length(min = 1, message = "must not be empty"))]
    pub date: String,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub timezone: String,
}

/// Converts readings to base units and UTC instants.
#[derive(Debug, Clone)]
pub struct MetricRecorder {
    resolver: TimezoneResolver,
}

/// Everything the caller needs to present a freshly prepared metric.
#[derive(Debug, Clone)]
pub struct PreparedMetric {
    pub metric: Metric,
    pub unit: Unit,
    pub zone: Timezone,
}

impl MetricRecorder {
    pub fn new(resolver: TimezoneResolver) -> Self {
        Self { resolver }
    }

    /// Validate `input` and build the record to persist.
    pub fn prepare(&self, input: &NewMetric) -> Result<PreparedMetric, CoreError> {
        input.validate()?;

        let zone = Timezone::parse(&input.timezone)?;
        let unit = Unit::parse(&input.unit, input.metric_type)?;
        if !input.value.is_finite() {
            return Err(CoreError::InvalidMetric(format!(
                "Value must be a finite number (got {})",
                input.value
            )));
        }

        let mut base_value = units::to_base(&unit, input.value);
        if base_value < 0.0 && base_value > -ZERO_NOISE {
            base_value = 0.0;
        }
        let timestamp = self.resolver.to_utc(&input.date, &zone)?;

        let metric = Metric::new(
            Uuid::new_v4(),
            input.user_id.clone(),
            input.metric_type,
            base_value,
            unit.id(),
            timestamp,
            Utc::now(),
        )?;

        Ok(PreparedMetric { metric, unit, zone })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
