//! Row model for the `metrics` table.

use mtrack_core::error::CoreError;
use mtrack_core::metric::Metric;
use mtrack_core::store::StoreError;
use mtrack_core::types::{EpochSeconds, MetricId, Timestamp};
use mtrack_core::units::{MetricType, UnitId};
use sqlx::FromRow;

/// A row from the `metrics` table.
///
/// `metric_type` and `original_unit` are stored as their lowercase
/// identifiers and parsed back through the domain types.
#[derive(Debug, Clone, FromRow)]
pub struct MetricRow {
    pub id: MetricId,
    pub user_id: String,
    pub metric_type: String,
    pub value: f64,
    pub original_unit: String,
    pub epoch_seconds: EpochSeconds,
    pub created_at: Timestamp,
}

impl TryFrom<MetricRow> for Metric {
    type Error = StoreError;

    fn try_from(row: MetricRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let invalid = |reason: String| StoreError::InvalidRecord(format!("metric {id}: {reason}"));

        let metric_type: MetricType = row
            .metric_type
            .parse()
            .map_err(|e: CoreError| invalid(e.to_string()))?;
        let original_unit: UnitId = row
            .original_unit
            .parse()
            .map_err(|e: CoreError| invalid(e.to_string()))?;

        Metric::new(
            id,
            row.user_id,
            metric_type,
            row.value,
            original_unit,
            row.epoch_seconds,
            row.created_at,
        )
        .map_err(|e| invalid(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;

    fn row(metric_type: &str, unit: &str, value: f64) -> MetricRow {
        MetricRow {
            id: Uuid::new_v4(),
            user_id: "user123".into(),
            metric_type: metric_type.into(),
            value,
            original_unit: unit.into(),
            epoch_seconds: 1_702_463_400,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn valid_row_converts() {
        let metric = Metric::try_from(row("temperature", "celsius", 298.15)).unwrap();
        assert_eq!(metric.metric_type, MetricType::Temperature);
        assert_eq!(metric.original_unit, UnitId::Celsius);
        assert_eq!(metric.timestamp, 1_702_463_400);
    }

    #[test]
    fn unknown_type_or_unit_is_invalid_record() {
        assert!(matches!(
            Metric::try_from(row("weight", "meter", 1.0)),
            Err(StoreError::InvalidRecord(_))
        ));
        assert!(matches!(
            Metric::try_from(row("distance", "parsec", 1.0)),
            Err(StoreError::InvalidRecord(_))
        ));
        assert!(matches!(
            Metric::try_from(row("distance", "kelvin", 1.0)),
            Err(StoreError::InvalidRecord(_))
        ));
    }

    #[test]
    fn negative_value_is_invalid_record() {
        assert!(matches!(
            Metric::try_from(row("distance", "meter", -1.0)),
            Err(StoreError::InvalidRecord(_))
        ));
    }
}
