//! ADC sampler adapter
//!
//! Implements `SamplerPort` on top of any blocking ADC read, for gauges that
//! output an analog level (resistive float, pressure transducer, ...).

use crate::domain::SensorId;
use crate::ports::sampler::{SamplerPort, SensorError};

/// Analog gauge read through a HAL-provided ADC
///
/// The read closure typically wraps `adc.blocking_read(&mut channel)`. The
/// ADC counts are passed on as the raw value; mapping them to percent is
/// the calibration's job.
pub struct AdcSampler<R> {
    /// Blocking ADC read
    read: R,
    /// Which gauge this is
    sensor_id: SensorId,
    /// Last raw ADC value (for diagnostics)
    last_raw: Option<u16>,
}

impl<R, E> AdcSampler<R>
where
    R: FnMut() -> Result<u16, E>,
{
    /// Create a new ADC sampler for the primary gauge
    pub fn new(read: R) -> Self {
        Self::with_sensor_id(read, SensorId::WATER_LEVEL)
    }

    /// Create with a specific sensor slot
    pub fn with_sensor_id(read: R, sensor_id: SensorId) -> Self {
        Self {
            read,
            sensor_id,
            last_raw: None,
        }
    }
}

impl<R, E> SamplerPort for AdcSampler<R>
where
    R: FnMut() -> Result<u16, E>,
{
    async fn sample(&mut self) -> Result<f32, SensorError> {
        let counts = (self.read)().map_err(|_| SensorError::ReadFailed)?;

        // Store for diagnostics
        self.last_raw = Some(counts);

        Ok(f32::from(counts))
    }

    fn sensor_id(&self) -> SensorId {
        self.sensor_id
    }

    fn last_raw_value(&self) -> Option<u16> {
        self.last_raw
    }
}
