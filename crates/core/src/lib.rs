//! Metric tracking domain: unit conversion, timezone resolution, daily
//! chart aggregation and the storage contract.
//!
//! No transport or database code lives here; adapters implement
//! [`store::MetricStore`] and callers drive [`service::MetricService`].

pub mod aggregation;
pub mod chart;
pub mod error;
pub mod metric;
pub mod recorder;
pub mod service;
pub mod store;
pub mod timezone;
pub mod types;
pub mod units;
