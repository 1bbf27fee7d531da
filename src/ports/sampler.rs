//! Sampler port - abstraction for reading the raw gauge input
//!
//! This trait lets the pipeline read raw samples without knowing the
//! hardware behind them (digit bus, ADC, mock, etc.)

use crate::domain::SensorId;

/// Error type for sampler operations
///
/// Every variant is treated as a transient hardware read failure by the
/// scheduler: the cycle publishes a fault and the next cycle reads again.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorError {
    /// Failed to read from sensor
    ReadFailed,
    /// No data seen from the sensor yet (disconnected or not powered)
    NotInitialized,
    /// Sensor returned invalid data
    InvalidData,
    /// Hardware error
    HardwareError,
    /// Timeout waiting for sensor
    Timeout,
}

/// Port for reading raw samples
///
/// Implementations should return within a bounded time. The scheduler also
/// wraps every call in a timeout, so a read that hangs ends up as
/// [`SensorError::Timeout`].
///
/// # Example Implementation
///
/// ```ignore
/// struct LevelAdc {
///     adc: Adc<'static, Blocking>,
///     channel: AdcChannel<'static>,
/// }
///
/// impl SamplerPort for LevelAdc {
///     async fn sample(&mut self) -> Result<f32, SensorError> {
///         let counts = self
///             .adc
///             .blocking_read(&mut self.channel)
///             .map_err(|_| SensorError::ReadFailed)?;
///         Ok(f32::from(counts))
///     }
///
///     fn sensor_id(&self) -> SensorId { SensorId::WATER_LEVEL }
/// }
/// ```
pub trait SamplerPort {
    /// Read one instantaneous raw value
    fn sample(&mut self) -> impl core::future::Future<Output = Result<f32, SensorError>>;

    /// Get the sensor identifier
    fn sensor_id(&self) -> SensorId;

    /// Get the last raw hardware value (for diagnostics)
    ///
    /// Returns `None` if the sampler doesn't expose raw values.
    fn last_raw_value(&self) -> Option<u16> {
        None
    }
}
