//! Descriptive tags the reporting layer attaches to published values
//!
//! None of this changes behavior. It tells the host framework how to label
//! and aggregate the readings.

use serde::Serialize;

/// Unit of the published value
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub enum MeasurementUnit {
    /// Percent (%).
    Percent,
}

impl MeasurementUnit {
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::Percent => "%",
        }
    }
}

/// What kind of physical quantity the sensor reports
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub enum DeviceClass {
    /// Moisture or liquid level.
    Moisture,
}

/// How consecutive values relate to each other
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub enum StateClass {
    /// Instantaneous measurement, not a running total.
    Measurement,
}

/// Metadata handed to the reporting port at registration
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SensorMetadata {
    /// Display name
    pub name: &'static str,
    pub unit: MeasurementUnit,
    /// Decimal places shown by the consumer
    pub accuracy_decimals: u8,
    pub device_class: DeviceClass,
    pub state_class: StateClass,
}

impl SensorMetadata {
    /// Tags for the tank water level gauge
    pub const WATER_LEVEL: Self = Self {
        name: "Water level",
        unit: MeasurementUnit::Percent,
        accuracy_decimals: 0,
        device_class: DeviceClass::Moisture,
        state_class: StateClass::Measurement,
    };

    /// Same tags with a different precision
    pub const fn with_decimals(self, accuracy_decimals: u8) -> Self {
        Self {
            accuracy_decimals,
            ..self
        }
    }
}

impl Default for SensorMetadata {
    fn default() -> Self {
        Self::WATER_LEVEL
    }
}
