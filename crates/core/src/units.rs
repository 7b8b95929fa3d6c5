//! Physical unit model and conversion (distance, temperature).
//!
//! Every metric type has one base unit in which values are persisted
//! (meter for distance, kelvin for temperature). Conversions are pure
//! functions of `(unit, value)`; rounding is applied only to values that
//! are handed back to a caller.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Offset between the Celsius and Kelvin scales.
pub const KELVIN_OFFSET: f64 = 273.15;

/// Fractional digits kept on values returned to callers.
pub const DISPLAY_DECIMALS: i32 = 6;

/// Meters per distance unit.
const DISTANCE_FACTORS: [(UnitId, f64); 5] = [
    (UnitId::Meter, 1.0),
    (UnitId::Centimeter, 0.01),
    (UnitId::Inch, 0.0254),
    (UnitId::Feet, 0.3048),
    (UnitId::Yard, 0.9144),
];

// ---------------------------------------------------------------------------
// Metric type
// ---------------------------------------------------------------------------

/// The closed set of quantities the service tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricType {
    Distance,
    Temperature,
}

impl MetricType {
    pub const ALL: [MetricType; 2] = [MetricType::Distance, MetricType::Temperature];

    pub fn as_str(self) -> &'static str {
        match self {
            MetricType::Distance => "distance",
            MetricType::Temperature => "temperature",
        }
    }

    /// The unit values of this type are stored in.
    pub fn base_unit(self) -> UnitId {
        match self {
            MetricType::Distance => UnitId::Meter,
            MetricType::Temperature => UnitId::Kelvin,
        }
    }
}

impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MetricType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| CoreError::Validation(format!("Unknown metric type '{s}'")))
    }
}

// ---------------------------------------------------------------------------
// Unit identifiers
// ---------------------------------------------------------------------------

/// Every unit identifier the service understands, across all metric types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitId {
    Meter,
    Centimeter,
    Inch,
    Feet,
    Yard,
    Kelvin,
    Celsius,
    Fahrenheit,
}

impl UnitId {
    pub const ALL: [UnitId; 8] = [
        UnitId::Meter,
        UnitId::Centimeter,
        UnitId::Inch,
        UnitId::Feet,
        UnitId::Yard,
        UnitId::Kelvin,
        UnitId::Celsius,
        UnitId::Fahrenheit,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            UnitId::Meter => "meter",
            UnitId::Centimeter => "centimeter",
            UnitId::Inch => "inch",
            UnitId::Feet => "feet",
            UnitId::Yard => "yard",
            UnitId::Kelvin => "kelvin",
            UnitId::Celsius => "celsius",
            UnitId::Fahrenheit => "fahrenheit",
        }
    }

    /// The metric type this identifier belongs to.
    pub fn metric_type(self) -> MetricType {
        match self {
            UnitId::Meter | UnitId::Centimeter | UnitId::Inch | UnitId::Feet | UnitId::Yard => {
                MetricType::Distance
            }
            UnitId::Kelvin | UnitId::Celsius | UnitId::Fahrenheit => MetricType::Temperature,
        }
    }

    /// All identifiers valid for `metric_type`.
    pub fn for_type(metric_type: MetricType) -> impl Iterator<Item = UnitId> {
        UnitId::ALL
            .into_iter()
            .filter(move |u| u.metric_type() == metric_type)
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UnitId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UnitId::ALL
            .into_iter()
            .find(|u| u.as_str() == s)
            .ok_or_else(|| CoreError::InvalidUnit(format!("Unknown unit '{s}'")))
    }
}

// ---------------------------------------------------------------------------
// Unit value object
// ---------------------------------------------------------------------------

/// A unit identifier checked against the metric type it is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Unit {
    id: UnitId,
    metric_type: MetricType,
}

impl Unit {
    /// Pair `id` with `metric_type`, rejecting identifiers of another type.
    pub fn new(id: UnitId, metric_type: MetricType) -> Result<Self, CoreError> {
        if id.metric_type() != metric_type {
            return Err(CoreError::InvalidUnit(format!(
                "Invalid unit '{id}' for metric type '{metric_type}'"
            )));
        }
        Ok(Self { id, metric_type })
    }

    /// Parse a unit identifier and check it against `metric_type`.
    pub fn parse(text: &str, metric_type: MetricType) -> Result<Self, CoreError> {
        let id = text.parse::<UnitId>().map_err(|_| {
            CoreError::InvalidUnit(format!(
                "Invalid unit '{text}' for metric type '{metric_type}'"
            ))
        })?;
        Self::new(id, metric_type)
    }

    /// Parse an optional display unit, falling back to the base unit.
    pub fn parse_or_base(text: Option<&str>, metric_type: MetricType) -> Result<Self, CoreError> {
        match text {
            Some(t) if !t.is_empty() => Self::parse(t, metric_type),
            _ => Ok(Self::base(metric_type)),
        }
    }

    /// The base unit of `metric_type`.
    pub fn base(metric_type: MetricType) -> Self {
        Self {
            id: metric_type.base_unit(),
            metric_type,
        }
    }

    pub fn id(&self) -> UnitId {
        self.id
    }

    pub fn metric_type(&self) -> MetricType {
        self.metric_type
    }

    pub fn is_base(&self) -> bool {
        self.id == self.metric_type.base_unit()
    }
}

// ---------------------------------------------------------------------------
// Conversion
// ---------------------------------------------------------------------------

/// The base unit of `metric_type`.
pub fn base_unit_of(metric_type: MetricType) -> UnitId {
    metric_type.base_unit()
}

/// Convert `value` expressed in `unit` into the base unit of its type.
pub fn to_base(unit: &Unit, value: f64) -> f64 {
    match unit.id {
        UnitId::Kelvin => value,
        UnitId::Celsius => value + KELVIN_OFFSET,
        UnitId::Fahrenheit => (value - 32.0) * 5.0 / 9.0 + KELVIN_OFFSET,
        distance => value * distance_factor(distance),
    }
}

/// Convert a base-unit value into `unit`.
pub fn from_base(unit: &Unit, base_value: f64) -> f64 {
    match unit.id {
        UnitId::Kelvin => base_value,
        UnitId::Celsius => base_value - KELVIN_OFFSET,
        UnitId::Fahrenheit => (base_value - KELVIN_OFFSET) * 9.0 / 5.0 + 32.0,
        distance => base_value / distance_factor(distance),
    }
}

/// Round a display value to [`DISPLAY_DECIMALS`] places, half away from zero.
pub fn round_display(value: f64) -> f64 {
    let scale = 10f64.powi(DISPLAY_DECIMALS);
    let scaled = value * scale;
    // Too large to carry fractional digits anyway.
    if !scaled.is_finite() {
        return value;
    }
    let rounded = scaled.round() / scale;
    // Normalize -0.0 so it serializes as 0.
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Convert a base value into `unit` and round it for display.
pub fn to_display(unit: &Unit, base_value: f64) -> f64 {
    round_display(from_base(unit, base_value))
}

fn distance_factor(id: UnitId) -> f64 {
    DISTANCE_FACTORS
        .iter()
        .find(|(u, _)| *u == id)
        .map(|(_, f)| *f)
        .unwrap_or(1.0)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
