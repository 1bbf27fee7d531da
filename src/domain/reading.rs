//! Sensor reading domain entity
//!
//! One `SensorReading` is produced per poll cycle and handed to the
//! reporting port. It carries either a calibrated percentage or a fault,
//! never both.

use serde::Serialize;

/// Non-numeric state published when the sensor misbehaves
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Fault {
    /// The input line could not be read this cycle (transient)
    HardwareRead,
    /// The last N filtered values did not move
    StuckSensor,
    /// The filtered value left the calibration range by more than the tolerance
    OutOfRange,
}

impl Fault {
    /// Short machine-readable name
    pub const fn as_str(&self) -> &'static str {
        match self {
            Fault::HardwareRead => "hardware_read",
            Fault::StuckSensor => "stuck_sensor",
            Fault::OutOfRange => "out_of_range",
        }
    }
}

/// A sensor reading from the domain perspective.
///
/// Immutable once built. `raw_value` and `filtered_value` are `None` when
/// the hardware read failed, since there is nothing to report for them.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SensorReading {
    /// Timestamp in microseconds since boot
    pub timestamp_us: i64,
    /// Sensor identifier
    pub sensor_id: SensorId,
    /// Raw sample as read from the input
    pub raw_value: Option<f32>,
    /// Smoothed value fed to fault detection and conversion
    pub filtered_value: Option<f32>,
    /// Calibrated level in percent, absent when `fault` is set
    pub calibrated_value: Option<f32>,
    /// Fault detected this cycle
    pub fault: Option<Fault>,
}

impl SensorReading {
    /// Create a healthy reading with a calibrated percentage
    pub const fn measured(
        timestamp_us: i64,
        sensor_id: SensorId,
        raw_value: f32,
        filtered_value: f32,
        percent: f32,
    ) -> Self {
        Self {
            timestamp_us,
            sensor_id,
            raw_value: Some(raw_value),
            filtered_value: Some(filtered_value),
            calibrated_value: Some(percent),
            fault: None,
        }
    }

    /// Create a fault reading for a sample that was read but rejected
    pub const fn faulted(
        timestamp_us: i64,
        sensor_id: SensorId,
        raw_value: f32,
        filtered_value: f32,
        fault: Fault,
    ) -> Self {
        Self {
            timestamp_us,
            sensor_id,
            raw_value: Some(raw_value),
            filtered_value: Some(filtered_value),
            calibrated_value: None,
            fault: Some(fault),
        }
    }

    /// Create a fault reading for a cycle where the input could not be read
    pub const fn read_failed(timestamp_us: i64, sensor_id: SensorId) -> Self {
        Self {
            timestamp_us,
            sensor_id,
            raw_value: None,
            filtered_value: None,
            calibrated_value: None,
            fault: Some(Fault::HardwareRead),
        }
    }

    /// Whether this reading reports a fault instead of a value
    pub const fn is_fault(&self) -> bool {
        self.fault.is_some()
    }
}

/// Sensor identifier (memory-efficient representation)
///
/// Uses a single byte so readings stay `Copy` and allocation-free. A device
/// may carry several gauges, each with its own slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SensorId(pub u8);

impl SensorId {
    /// Primary water level gauge
    pub const WATER_LEVEL: SensorId = SensorId(0);

    /// Test/mock sensor
    pub const TEST: SensorId = SensorId(255);

    /// Create a new sensor ID from a raw value
    pub const fn new(id: u8) -> Self {
        Self(id)
    }

    /// Get the string representation of this sensor ID
    pub const fn as_str(&self) -> &'static str {
        match self.0 {
            0 => "water_level",
            255 => "test",
            _ => "unknown",
        }
    }

    /// Get the raw ID value
    pub const fn value(&self) -> u8 {
        self.0
    }
}
