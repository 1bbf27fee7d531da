//! Polling scheduler
//!
//! Owns the cadence and drives one pass of the pipeline per tick:
//!
//! ```text
//! Idle ──tick──► Sampling ──► Publishing ──► Idle
//!                  │ sample → filter → fault check → convert
//! ```
//!
//! Every cycle publishes exactly one reading, either a percentage or a
//! fault. Ticks that come late are not made up for: the next deadline is
//! counted from the tick that actually ran.

use embassy_time::{with_timeout, Duration, Instant, Timer};

use crate::config::{ConfigError, WaterLevelConfig};
use crate::domain::{Filter, FaultDetector, SensorId, SensorMetadata, SensorReading, UnitConverter};
use crate::log;
use crate::ports::reporting::ReportingPort;
use crate::ports::sampler::{SamplerPort, SensorError};

/// Where the scheduler is within a poll cycle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SchedulerState {
    /// Waiting for the next tick
    Idle,
    /// Reading and processing a sample
    Sampling,
    /// Handing the reading to the reporting port
    Publishing,
}

/// Drives the sampling pipeline for one gauge
pub struct PollingScheduler<S, R> {
    sampler: S,
    sink: R,
    filter: Filter,
    detector: FaultDetector,
    converter: UnitConverter,
    config: WaterLevelConfig,
    metadata: SensorMetadata,
    state: SchedulerState,
    started: bool,
    /// `None` means the next poll is due immediately
    next_due: Option<Instant>,
    cycles: u32,
    faults: u32,
}

impl<S: SamplerPort, R: ReportingPort> PollingScheduler<S, R> {
    /// Compose the pipeline from a validated configuration
    ///
    /// Fails on any configuration error, most notably
    /// [`ConfigError::InvalidCalibration`]. No polling is possible without a
    /// scheduler, so a bad calibration stops the gauge before it starts.
    pub fn new(config: WaterLevelConfig, sampler: S, sink: R) -> Result<Self, ConfigError> {
        config.validate()?;

        let converter = UnitConverter::new(config.calibration)?;
        let detector = FaultDetector::new(config.faults, config.calibration)?;
        let filter = Filter::new(config.filter)?;

        Ok(Self {
            sampler,
            sink,
            filter,
            detector,
            converter,
            config,
            metadata: SensorMetadata::WATER_LEVEL.with_decimals(config.calibration.decimals),
            state: SchedulerState::Idle,
            started: false,
            next_due: None,
            cycles: 0,
            faults: 0,
        })
    }

    /// Replace the descriptive tags announced at `start`
    pub fn with_metadata(mut self, metadata: SensorMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Register with the reporting port and enable polling
    ///
    /// A failed registration is logged; polling starts regardless.
    pub async fn start(&mut self) {
        log::info!(
            "Setting up sensor '{}' (every {} ms)",
            self.metadata.name,
            self.config.cadence.interval_ms
        );

        if let Err(e) = self.sink.register(&self.metadata).await {
            log::warn!("Registration failed: {:?}", e);
        }

        self.started = true;
        self.next_due = None;
        self.state = SchedulerState::Idle;
    }

    /// Stop polling and drop the filter history
    pub fn teardown(&mut self) {
        log::info!("Tearing down sensor '{}'", self.metadata.name);
        self.started = false;
        self.next_due = None;
        self.filter.reset();
        self.state = SchedulerState::Idle;
    }

    /// Non-blocking timer check
    ///
    /// Runs one cycle if the cadence is due at `now` and returns the
    /// published reading, otherwise returns `None` straight away.
    pub async fn poll(&mut self, now: Instant) -> Option<SensorReading> {
        if !self.started {
            return None;
        }
        if let Some(due) = self.next_due {
            if now < due {
                return None;
            }
        }

        let reading = self.run_cycle(now).await;
        // Counted from this tick, so a late tick is never followed by a burst
        self.next_due = Some(deadline_after(now, self.config.cadence.interval()));
        Some(reading)
    }

    /// Poll forever, yielding to other tasks between ticks
    pub async fn run(&mut self) {
        if !self.started {
            self.start().await;
        }

        loop {
            let now = Instant::now();
            self.poll(now).await;
            Timer::at(self.next_due.unwrap_or(now)).await;
        }
    }

    async fn run_cycle(&mut self, now: Instant) -> SensorReading {
        self.state = SchedulerState::Sampling;

        let timestamp_us = now.as_micros() as i64;
        let sensor_id = self.sampler.sensor_id();

        let reading = match self.read_raw().await {
            Ok(raw) => self.process(timestamp_us, sensor_id, raw),
            Err(e) => {
                log::warn!("Hardware read failed: {:?}", e);
                SensorReading::read_failed(timestamp_us, sensor_id)
            }
        };

        self.state = SchedulerState::Publishing;

        if let Some(fault) = reading.fault {
            self.faults = self.faults.wrapping_add(1);
            log::warn!("Publishing fault: {}", fault.as_str());
        } else if let Some(percent) = reading.calibrated_value {
            log::debug!("Got value: {}", percent);
        }

        if let Err(e) = self.sink.publish(&reading).await {
            log::warn!("Publish failed: {:?}", e);
        }

        self.cycles = self.cycles.wrapping_add(1);
        self.state = SchedulerState::Idle;
        reading
    }

    /// Read one sample, retrying at most once if configured to
    async fn read_raw(&mut self) -> Result<f32, SensorError> {
        match self.read_once().await {
            Err(e) if self.config.retry_failed_read => {
                log::debug!("Read failed ({:?}), retrying once", e);
                self.read_once().await
            }
            result => result,
        }
    }

    async fn read_once(&mut self) -> Result<f32, SensorError> {
        let raw = with_timeout(self.config.read_timeout(), self.sampler.sample())
            .await
            .map_err(|_| SensorError::Timeout)??;

        // A NaN would poison the filter state for good
        if !raw.is_finite() {
            return Err(SensorError::InvalidData);
        }
        Ok(raw)
    }

    fn process(&mut self, timestamp_us: i64, sensor_id: SensorId, raw: f32) -> SensorReading {
        let filtered = self.filter.update(raw);

        match self.detector.check(filtered, self.filter.history()) {
            Some(fault) => SensorReading::faulted(timestamp_us, sensor_id, raw, filtered, fault),
            None => {
                let percent = self.converter.convert(filtered);
                SensorReading::measured(timestamp_us, sensor_id, raw, filtered, percent)
            }
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Deadline of the next cycle, `None` if due immediately
    pub fn next_due(&self) -> Option<Instant> {
        self.next_due
    }

    /// Completed poll cycles
    pub fn cycles(&self) -> u32 {
        self.cycles
    }

    /// Cycles that published a fault
    pub fn faults(&self) -> u32 {
        self.faults
    }

    pub fn config(&self) -> &WaterLevelConfig {
        &self.config
    }

    pub fn metadata(&self) -> &SensorMetadata {
        &self.metadata
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    pub fn sampler(&self) -> &S {
        &self.sampler
    }

    pub fn sink(&self) -> &R {
        &self.sink
    }
}

/// `now + interval`, pinned to `Instant::MAX` near the end of the clock
fn deadline_after(now: Instant, interval: Duration) -> Instant {
    now.checked_add(interval).unwrap_or(Instant::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PollCadence;
    use crate::domain::{CalibrationConfig, Fault, FilterMode};
    use crate::ports::reporting::ReportError;
    use embassy_futures::block_on;
    use std::collections::VecDeque;
    use std::vec::Vec;

    #[derive(Clone, Copy, Debug)]
    enum Step {
        Value(f32),
        Fail,
        Hang,
    }

    struct ScriptedSampler {
        steps: VecDeque<Step>,
        calls: usize,
    }

    impl ScriptedSampler {
        fn new(steps: &[Step]) -> Self {
            Self {
                steps: steps.iter().copied().collect(),
                calls: 0,
            }
        }

        fn values(values: &[f32]) -> Self {
            let steps: Vec<Step> = values.iter().map(|&v| Step::Value(v)).collect();
            Self::new(&steps)
        }
    }

    impl SamplerPort for ScriptedSampler {
        async fn sample(&mut self) -> Result<f32, SensorError> {
            self.calls += 1;
            match self.steps.pop_front() {
                Some(Step::Value(v)) => Ok(v),
                Some(Step::Fail) | None => Err(SensorError::ReadFailed),
                Some(Step::Hang) => core::future::pending().await,
            }
        }

        fn sensor_id(&self) -> SensorId {
            SensorId::TEST
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        registered: Option<SensorMetadata>,
        published: Vec<SensorReading>,
        refuse: bool,
    }

    impl ReportingPort for RecordingSink {
        async fn register(&mut self, metadata: &SensorMetadata) -> Result<(), ReportError> {
            self.registered = Some(*metadata);
            Ok(())
        }

        async fn publish(&mut self, reading: &SensorReading) -> Result<(), ReportError> {
            if self.refuse {
                return Err(ReportError::NotConnected);
            }
            self.published.push(*reading);
            Ok(())
        }
    }

    const MINUTE: u64 = 60_000;

    fn at(ms: u64) -> Instant {
        Instant::from_millis(ms)
    }

    fn passthrough() -> WaterLevelConfig {
        WaterLevelConfig {
            filter: FilterMode::PASSTHROUGH,
            ..WaterLevelConfig::default()
        }
    }

    fn started(
        config: WaterLevelConfig,
        sampler: ScriptedSampler,
    ) -> PollingScheduler<ScriptedSampler, RecordingSink> {
        let mut scheduler = PollingScheduler::new(config, sampler, RecordingSink::default()).unwrap();
        block_on(scheduler.start());
        scheduler
    }

    #[test]
    fn test_unsmoothed_samples_publish_exact_percentages() {
        let mut scheduler = started(passthrough(), ScriptedSampler::values(&[0.0, 50.0, 100.0]));

        for tick in 0..3 {
            assert!(block_on(scheduler.poll(at(tick * MINUTE))).is_some());
        }

        let published: Vec<Option<f32>> = scheduler
            .sink()
            .published
            .iter()
            .map(|r| r.calibrated_value)
            .collect();
        assert_eq!(published, [Some(0.0), Some(50.0), Some(100.0)]);
        assert_eq!(scheduler.faults(), 0);
    }

    #[test]
    fn test_invalid_calibration_refuses_to_start() {
        let config = WaterLevelConfig {
            calibration: CalibrationConfig::new(10.0, 10.0, 0),
            ..WaterLevelConfig::default()
        };
        let result = PollingScheduler::new(config, ScriptedSampler::values(&[10.0]), RecordingSink::default());
        assert!(matches!(result, Err(ConfigError::InvalidCalibration)));
    }

    #[test]
    fn test_transient_read_failure_costs_one_cycle() {
        let sampler = ScriptedSampler::new(&[Step::Fail, Step::Value(30.0)]);
        let mut scheduler = started(passthrough(), sampler);

        let first = block_on(scheduler.poll(at(0))).unwrap();
        assert_eq!(first.fault, Some(Fault::HardwareRead));
        assert_eq!(scheduler.next_due(), Some(at(MINUTE)));

        assert!(block_on(scheduler.poll(at(MINUTE / 2))).is_none());

        let second = block_on(scheduler.poll(at(MINUTE))).unwrap();
        assert_eq!(second.fault, None);
        assert_eq!(second.calibrated_value, Some(30.0));
        assert_eq!(scheduler.next_due(), Some(at(2 * MINUTE)));

        assert_eq!(scheduler.sink().published.len(), 2);
        assert_eq!(scheduler.cycles(), 2);
        assert_eq!(scheduler.faults(), 1);
    }

    #[test]
    fn test_poll_before_start_does_nothing() {
        let mut scheduler =
            PollingScheduler::new(passthrough(), ScriptedSampler::values(&[1.0]), RecordingSink::default())
                .unwrap();
        assert!(block_on(scheduler.poll(at(0))).is_none());
        assert_eq!(scheduler.sampler().calls, 0);
        assert!(scheduler.sink().published.is_empty());
    }

    #[test]
    fn test_start_registers_metadata() {
        let config = WaterLevelConfig {
            calibration: CalibrationConfig::new(0.0, 100.0, 1),
            ..WaterLevelConfig::default()
        };
        let scheduler = started(config, ScriptedSampler::values(&[]));
        let registered = scheduler.sink().registered.unwrap();
        assert_eq!(registered.name, "Water level");
        assert_eq!(registered.accuracy_decimals, 1);
        assert!(scheduler.is_started());
    }

    #[test]
    fn test_custom_metadata_is_registered() {
        let tank_b = SensorMetadata {
            name: "Rain tank",
            ..SensorMetadata::WATER_LEVEL
        };
        let mut scheduler =
            PollingScheduler::new(passthrough(), ScriptedSampler::values(&[]), RecordingSink::default())
                .unwrap()
                .with_metadata(tank_b);
        block_on(scheduler.start());

        assert_eq!(scheduler.metadata().name, "Rain tank");
        assert_eq!(scheduler.sink().registered, Some(tank_b));
    }

    #[test]
    fn test_deadline_saturates_at_end_of_clock() {
        let interval = PollCadence::DEFAULT.interval();
        assert_eq!(deadline_after(at(0), interval), at(MINUTE));

        let near_end = Instant::MAX - Duration::from_secs(1);
        assert_eq!(deadline_after(near_end, interval), Instant::MAX);
    }

    #[test]
    fn test_late_tick_is_not_caught_up() {
        let mut scheduler = started(passthrough(), ScriptedSampler::values(&[10.0, 20.0, 30.0]));

        assert!(block_on(scheduler.poll(at(0))).is_some());
        // Two and a half intervals late: one cycle, not three
        assert!(block_on(scheduler.poll(at(150_000))).is_some());
        assert_eq!(scheduler.next_due(), Some(at(210_000)));
        assert!(block_on(scheduler.poll(at(180_000))).is_none());
        assert_eq!(scheduler.sink().published.len(), 2);
    }

    #[test]
    fn test_unchanged_value_is_published_every_cycle() {
        let config = WaterLevelConfig {
            faults: crate::domain::FaultConfig {
                stuck_window: 0,
                ..Default::default()
            },
            ..passthrough()
        };
        let mut scheduler = started(config, ScriptedSampler::values(&[64.0; 4]));
        for tick in 0..4 {
            block_on(scheduler.poll(at(tick * MINUTE)));
        }
        assert_eq!(scheduler.sink().published.len(), 4);
        assert!(scheduler.sink().published.iter().all(|r| r.calibrated_value == Some(64.0)));
    }

    #[test]
    fn test_stuck_sensor_published_as_fault() {
        let mut scheduler = started(WaterLevelConfig::default(), ScriptedSampler::values(&[42.0; 10]));
        for tick in 0..10 {
            block_on(scheduler.poll(at(tick * MINUTE)));
        }

        let published = &scheduler.sink().published;
        assert!(published[..9].iter().all(|r| r.calibrated_value == Some(42.0)));
        assert_eq!(published[9].fault, Some(Fault::StuckSensor));
        assert_eq!(published[9].calibrated_value, None);
    }

    #[test]
    fn test_out_of_range_skips_conversion() {
        let mut scheduler = started(passthrough(), ScriptedSampler::values(&[250.0]));
        let reading = block_on(scheduler.poll(at(0))).unwrap();
        assert_eq!(reading.fault, Some(Fault::OutOfRange));
        assert_eq!(reading.raw_value, Some(250.0));
        assert_eq!(reading.calibrated_value, None);
    }

    #[test]
    fn test_retry_recovers_within_cycle() {
        let config = WaterLevelConfig {
            retry_failed_read: true,
            ..passthrough()
        };
        let sampler = ScriptedSampler::new(&[Step::Fail, Step::Value(40.0), Step::Fail, Step::Fail]);
        let mut scheduler = started(config, sampler);

        let reading = block_on(scheduler.poll(at(0))).unwrap();
        assert_eq!(reading.calibrated_value, Some(40.0));

        // Never more than one retry
        let reading = block_on(scheduler.poll(at(MINUTE))).unwrap();
        assert_eq!(reading.fault, Some(Fault::HardwareRead));
        assert_eq!(scheduler.sampler().calls, 4);
    }

    #[test]
    fn test_hanging_read_times_out() {
        let config = WaterLevelConfig {
            read_timeout_ms: 10,
            ..passthrough()
        };
        let mut scheduler = started(config, ScriptedSampler::new(&[Step::Hang, Step::Value(5.0)]));

        let reading = block_on(scheduler.poll(at(0))).unwrap();
        assert_eq!(reading.fault, Some(Fault::HardwareRead));

        let reading = block_on(scheduler.poll(at(MINUTE))).unwrap();
        assert_eq!(reading.calibrated_value, Some(5.0));
    }

    #[test]
    fn test_nan_sample_does_not_poison_filter() {
        let mut scheduler = started(WaterLevelConfig::default(), ScriptedSampler::values(&[f32::NAN, 20.0]));

        let reading = block_on(scheduler.poll(at(0))).unwrap();
        assert_eq!(reading.fault, Some(Fault::HardwareRead));
        assert_eq!(scheduler.filter().last_filtered(), None);

        let reading = block_on(scheduler.poll(at(MINUTE))).unwrap();
        assert_eq!(reading.calibrated_value, Some(20.0));
    }

    #[test]
    fn test_publish_failure_keeps_polling() {
        let mut scheduler = started(passthrough(), ScriptedSampler::values(&[1.0, 2.0]));
        let mut sink_refuses = RecordingSink::default();
        sink_refuses.refuse = true;
        scheduler.sink = sink_refuses;

        assert!(block_on(scheduler.poll(at(0))).is_some());
        assert!(block_on(scheduler.poll(at(MINUTE))).is_some());
        assert_eq!(scheduler.cycles(), 2);
        assert_eq!(scheduler.state(), SchedulerState::Idle);
    }

    #[test]
    fn test_teardown_stops_polling_and_resets_filter() {
        let mut scheduler = started(WaterLevelConfig::default(), ScriptedSampler::values(&[10.0, 90.0]));
        block_on(scheduler.poll(at(0)));
        assert_eq!(scheduler.filter().last_filtered(), Some(10.0));

        scheduler.teardown();
        assert!(!scheduler.is_started());
        assert!(block_on(scheduler.poll(at(MINUTE))).is_none());

        block_on(scheduler.start());
        let reading = block_on(scheduler.poll(at(MINUTE))).unwrap();
        // No warm-up bias from the samples before teardown
        assert_eq!(reading.filtered_value, Some(90.0));
    }

    #[test]
    fn test_run_loop_follows_cadence() {
        use embassy_futures::select::select;

        let config = WaterLevelConfig {
            cadence: PollCadence::from_millis(50),
            read_timeout_ms: 50,
            ..passthrough()
        };
        let mut scheduler = PollingScheduler::new(
            config,
            ScriptedSampler::values(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]),
            RecordingSink::default(),
        )
        .unwrap();

        block_on(select(scheduler.run(), Timer::after(Duration::from_millis(120))));

        // Ticks at ~0, ~50 and ~100 ms
        let published = scheduler.sink().published.len();
        assert!((2..=4).contains(&published), "published {published}");
        assert!(scheduler.sink().registered.is_some());
    }
}
