//! Reporting port - abstraction for the sink that receives readings
//!
//! The host framework implements this to forward readings to wherever it
//! publishes sensor state. The core only calls it; it owns no transport.

use crate::domain::{SensorMetadata, SensorReading};

/// Error type for reporting operations
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReportError {
    /// Sink is not connected
    NotConnected,
    /// Failed to hand the reading over
    SendFailed,
    /// Sink refused the reading
    Rejected,
}

/// Port for publishing readings
///
/// # Example Implementation
///
/// ```ignore
/// struct ChannelSink(Sender<'static, CriticalSectionRawMutex, SensorReading, 4>);
///
/// impl ReportingPort for ChannelSink {
///     async fn publish(&mut self, reading: &SensorReading) -> Result<(), ReportError> {
///         self.0.try_send(*reading).map_err(|_| ReportError::SendFailed)
///     }
/// }
/// ```
pub trait ReportingPort {
    /// Announce the sensor before the first reading
    ///
    /// Called once from `PollingScheduler::start`.
    fn register(
        &mut self,
        metadata: &SensorMetadata,
    ) -> impl core::future::Future<Output = Result<(), ReportError>> {
        let _ = metadata;
        async { Ok(()) }
    }

    /// Publish one reading
    ///
    /// Called exactly once per poll cycle, whether the value changed or not.
    fn publish(
        &mut self,
        reading: &SensorReading,
    ) -> impl core::future::Future<Output = Result<(), ReportError>>;
}
