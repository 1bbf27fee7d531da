//! Ports (interfaces) defining the boundaries of the pipeline
//!
//! In hexagonal architecture, ports define the "holes" in the hexagon where
//! adapters plug in:
//!
//! - **SamplerPort**: How we get a raw value (digit bus, ADC, mock)
//! - **ReportingPort**: Where readings go (host framework, channel, mock)

pub mod reporting;
pub mod sampler;

pub use reporting::{ReportError, ReportingPort};
pub use sampler::{SamplerPort, SensorError};
