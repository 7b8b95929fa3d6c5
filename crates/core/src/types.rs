/// Metric identifiers are UUID v4.
pub type MetricId = uuid::Uuid;

/// Seconds since the Unix epoch, always UTC.
pub type EpochSeconds = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
