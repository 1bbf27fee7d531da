//! Fault detection over the filtered value history

use heapless::HistoryBuffer;
use micromath::F32Ext;
use serde::{Deserialize, Serialize};

use super::calibration::CalibrationConfig;
use super::filter::HISTORY_CAPACITY;
use super::reading::Fault;
use crate::config::ConfigError;

/// Thresholds for the semantic fault checks
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(default)]
pub struct FaultConfig {
    /// Number of identical filtered values that mark the sensor as stuck (0 disables)
    pub stuck_window: u8,
    /// Largest difference still counted as "identical"
    pub stuck_epsilon: f32,
    /// Raw units the filtered value may stray outside the calibration range
    pub out_of_range_tolerance: f32,
}

impl FaultConfig {
    /// Check thresholds against the history capacity
    pub fn validate(&self) -> Result<(), ConfigError> {
        if usize::from(self.stuck_window) > HISTORY_CAPACITY {
            return Err(ConfigError::InvalidFaultConfig);
        }
        for threshold in [self.stuck_epsilon, self.out_of_range_tolerance] {
            if !(threshold.is_finite() && threshold >= 0.0) {
                return Err(ConfigError::InvalidFaultConfig);
            }
        }
        Ok(())
    }
}

impl Default for FaultConfig {
    fn default() -> Self {
        Self {
            stuck_window: 10,
            stuck_epsilon: 1e-3,
            out_of_range_tolerance: 5.0,
        }
    }
}

/// Flags stuck and out-of-range readings
///
/// Stateless: every check is a pure function of the current filtered value
/// and the history it is handed.
#[derive(Clone, Copy, Debug)]
pub struct FaultDetector {
    config: FaultConfig,
    calibration: CalibrationConfig,
}

impl FaultDetector {
    pub fn new(config: FaultConfig, calibration: CalibrationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        calibration.validate()?;
        Ok(Self {
            config,
            calibration,
        })
    }

    pub fn config(&self) -> FaultConfig {
        self.config
    }

    /// Check the latest filtered value
    ///
    /// `history` must already contain `filtered` as its newest entry.
    /// Out-of-range takes precedence over a stuck sensor.
    pub fn check(
        &self,
        filtered: f32,
        history: &HistoryBuffer<f32, HISTORY_CAPACITY>,
    ) -> Option<Fault> {
        if !filtered.is_finite()
            || !self
                .calibration
                .contains(filtered, self.config.out_of_range_tolerance)
        {
            return Some(Fault::OutOfRange);
        }

        if self.is_stuck(history) {
            return Some(Fault::StuckSensor);
        }

        None
    }

    fn is_stuck(&self, history: &HistoryBuffer<f32, HISTORY_CAPACITY>) -> bool {
        let window = usize::from(self.config.stuck_window);
        let len = history.len();
        if window == 0 || len < window {
            return false;
        }

        let mut recent = history.oldest_ordered().skip(len - window);
        let Some(&first) = recent.next() else {
            return false;
        };
        recent.all(|&value| F32Ext::abs(value - first) <= self.config.stuck_epsilon)
    }
}
