//! Water Level Sensor Library
//!
//! This library turns raw samples from a tank water level gauge into a
//! smoothed, fault-checked percentage, using a hexagonal architecture so the
//! pipeline runs the same against real hardware and test doubles.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Scheduler                                    │
//! │  - PollingScheduler: cadence, one reading per cycle             │
//! └─────────────────────────────────────────────────────────────────┘
//!                               │
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Domain Layer                                 │
//! │  - Filter: EMA / running median                                 │
//! │  - FaultDetector: out-of-range, stuck sensor                    │
//! │  - UnitConverter: calibration to percent                        │
//! │  - SensorReading entity                                          │
//! └─────────────────────────────────────────────────────────────────┘
//!                               │
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Ports (Traits)                               │
//! │  - SamplerPort: read a raw value                                │
//! │  - ReportingPort: register the sensor, publish readings         │
//! └─────────────────────────────────────────────────────────────────┘
//!                               │
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Adapters                                     │
//! │  - DigitBusSampler: multiplexed BCD display over GPIO           │
//! │  - AdcSampler: analog gauge over any blocking ADC               │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! let sampler = DigitBusSampler::new(data_pins, strobe_pins);
//! let mut scheduler = PollingScheduler::new(WaterLevelConfig::default(), sampler, sink)?;
//! scheduler.run().await;
//! ```

#![cfg_attr(not(test), no_std)]

pub(crate) mod log;

pub mod config;

/// Domain layer - pure business logic
pub mod domain;

/// Ports - traits defining boundaries
pub mod ports;

/// Adapters - concrete implementations
pub mod adapters;

pub mod scheduler;

pub use config::{ConfigError, PollCadence, WaterLevelConfig};

// Re-export key domain types
pub use domain::{
    CalibrationConfig, Fault, FaultConfig, FilterMode, SensorId, SensorMetadata, SensorReading,
};

// Re-export key port traits
pub use ports::{ReportError, ReportingPort, SamplerPort, SensorError};

// Re-export adapters
pub use adapters::{AdcSampler, DigitBusSampler};

pub use scheduler::{PollingScheduler, SchedulerState};
