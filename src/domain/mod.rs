//! Domain layer - pure signal processing, independent of hardware
//!
//! Everything a raw sample goes through before it is published:
//! smoothing, fault checks and conversion to percent, plus the reading
//! entity that carries the result.

pub mod calibration;
pub mod fault;
pub mod filter;
pub mod metadata;
pub mod reading;

pub use calibration::{CalibrationConfig, UnitConverter, MAX_DECIMALS};
pub use fault::{FaultConfig, FaultDetector};
pub use filter::{Filter, FilterMode, FilterState, DEFAULT_ALPHA, HISTORY_CAPACITY, MAX_MEDIAN_WINDOW};
pub use metadata::{DeviceClass, MeasurementUnit, SensorMetadata, StateClass};
pub use reading::{Fault, SensorId, SensorReading};
