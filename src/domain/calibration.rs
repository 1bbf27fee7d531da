//! Calibration domain service
//!
//! Maps filtered raw readings onto a 0-100 % scale using a linear
//! calibration range.

use micromath::F32Ext;
use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// Highest supported rounding precision
pub const MAX_DECIMALS: u8 = 6;

/// Calibration range for the gauge
///
/// `min_raw` maps to 0 % and `max_raw` maps to 100 %.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(default)]
pub struct CalibrationConfig {
    /// Raw value for an empty tank
    pub min_raw: f32,
    /// Raw value for a full tank
    pub max_raw: f32,
    /// Decimal places kept in the published percentage
    pub decimals: u8,
}

impl CalibrationConfig {
    /// Digit-bus gauge: the display already reads 0-100
    pub const DIGIT_GAUGE: Self = Self {
        min_raw: 0.0,
        max_raw: 100.0,
        decimals: 0,
    };

    /// Create a new calibration with custom parameters
    pub const fn new(min_raw: f32, max_raw: f32, decimals: u8) -> Self {
        Self {
            min_raw,
            max_raw,
            decimals,
        }
    }

    /// Check the invariants: finite bounds, `min_raw < max_raw`, bounded precision
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.min_raw.is_finite() || !self.max_raw.is_finite() {
            return Err(ConfigError::InvalidCalibration);
        }
        // Equal bounds would divide by zero in `convert`
        if self.min_raw >= self.max_raw {
            return Err(ConfigError::InvalidCalibration);
        }
        if self.decimals > MAX_DECIMALS {
            return Err(ConfigError::InvalidCalibration);
        }
        Ok(())
    }

    /// Width of the calibration range in raw units
    #[inline]
    pub fn span(&self) -> f32 {
        self.max_raw - self.min_raw
    }

    /// Whether `raw` lies inside `[min_raw - tolerance, max_raw + tolerance]`
    #[inline]
    pub fn contains(&self, raw: f32, tolerance: f32) -> bool {
        raw >= self.min_raw - tolerance && raw <= self.max_raw + tolerance
    }
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self::DIGIT_GAUGE
    }
}

/// Converts filtered raw values to a calibrated percentage
///
/// Construction validates the calibration, so a converter that exists can
/// always convert.
#[derive(Clone, Copy, Debug)]
pub struct UnitConverter {
    calibration: CalibrationConfig,
    scale: f32,
}

impl UnitConverter {
    /// Create a converter, rejecting an unusable calibration
    pub fn new(calibration: CalibrationConfig) -> Result<Self, ConfigError> {
        calibration.validate()?;
        Ok(Self {
            calibration,
            scale: F32Ext::powi(10.0f32, i32::from(calibration.decimals)),
        })
    }

    /// Current calibration
    pub fn calibration(&self) -> CalibrationConfig {
        self.calibration
    }

    /// Convert a filtered raw value to percent
    ///
    /// The result is clamped to `[0, 100]` and rounded to the configured
    /// number of decimals.
    pub fn convert(&self, filtered: f32) -> f32 {
        let cal = &self.calibration;
        let percent = ((filtered - cal.min_raw) / cal.span() * 100.0).clamp(0.0, 100.0);
        // Explicit so host builds round the same way as the firmware
        F32Ext::round(percent * self.scale) / self.scale
    }
}
