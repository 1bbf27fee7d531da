//! Startup configuration
//!
//! The firmware's configuration layer fills a [`WaterLevelConfig`] and hands
//! it to [`PollingScheduler::new`](crate::PollingScheduler::new). Every
//! field has a default, so a partial config deserializes into a usable one.
//! Validation happens once, before any polling.

use serde::{Deserialize, Serialize};

use crate::domain::{CalibrationConfig, FaultConfig, FilterMode};

/// Configuration errors, all fatal at startup
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// `min_raw` is not below `max_raw`, a bound is not finite, or too many decimals
    InvalidCalibration,
    /// Poll interval or read timeout is zero or above its ceiling
    InvalidCadence,
    /// Filter parameters out of range
    InvalidFilter,
    /// Fault thresholds out of range
    InvalidFaultConfig,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InvalidCalibration => write!(f, "invalid calibration range"),
            Self::InvalidCadence => write!(f, "poll interval or read timeout out of range"),
            Self::InvalidFilter => write!(f, "invalid filter parameters"),
            Self::InvalidFaultConfig => write!(f, "invalid fault detection thresholds"),
        }
    }
}

/// Longest supported poll interval (24 h)
pub const MAX_INTERVAL_MS: u64 = 24 * 60 * 60 * 1_000;

/// Longest supported single hardware read (60 s)
pub const MAX_READ_TIMEOUT_MS: u64 = 60_000;

/// How often the pipeline runs
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PollCadence {
    /// Interval between poll cycles (milliseconds)
    pub interval_ms: u64,
}

impl PollCadence {
    /// Default update interval of the gauge (60 s)
    pub const DEFAULT: Self = Self::from_millis(60_000);

    pub const fn from_millis(interval_ms: u64) -> Self {
        Self { interval_ms }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval_ms == 0 || self.interval_ms > MAX_INTERVAL_MS {
            return Err(ConfigError::InvalidCadence);
        }
        Ok(())
    }

    pub fn interval(&self) -> embassy_time::Duration {
        embassy_time::Duration::from_millis(self.interval_ms)
    }
}

impl Default for PollCadence {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Complete configuration of one water level gauge
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(default)]
pub struct WaterLevelConfig {
    pub calibration: CalibrationConfig,
    pub cadence: PollCadence,
    pub filter: FilterMode,
    pub faults: FaultConfig,
    /// Upper bound on a single hardware read (milliseconds)
    pub read_timeout_ms: u64,
    /// Retry a failed read once within the same cycle
    pub retry_failed_read: bool,
}

impl WaterLevelConfig {
    /// Validate every section, calibration first
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.calibration.validate()?;
        self.cadence.validate()?;
        self.filter.validate()?;
        self.faults.validate()?;
        if self.read_timeout_ms == 0 || self.read_timeout_ms > MAX_READ_TIMEOUT_MS {
            return Err(ConfigError::InvalidCadence);
        }
        Ok(())
    }

    pub fn read_timeout(&self) -> embassy_time::Duration {
        embassy_time::Duration::from_millis(self.read_timeout_ms)
    }
}

impl Default for WaterLevelConfig {
    fn default() -> Self {
        Self {
            calibration: CalibrationConfig::default(),
            cadence: PollCadence::default(),
            filter: FilterMode::default(),
            faults: FaultConfig::default(),
            read_timeout_ms: 1_000,
            retry_failed_read: false,
        }
    }
}
