//! Digit bus sampler adapter
//!
//! The float gauge drives a multiplexed three-digit display. Seven lines are
//! tapped off its driver:
//!
//! ```text
//! bit  0  1  2  3  4   5   6
//!      A  B  C  D  L1  L2  L3
//!      └─ BCD ──┘  └ strobes ┘
//! ```
//!
//! While a strobe line is high the BCD nibble on A..D belongs to that digit
//! (L1 hundreds, L2 tens, L3 units). A nibble of `0xF` blanks the digit.

use embassy_futures::yield_now;
use embedded_hal::digital::InputPin;

use crate::domain::SensorId;
use crate::log;
use crate::ports::sampler::{SamplerPort, SensorError};

/// Bus scans per `sample()` call if not configured otherwise
pub const DEFAULT_BURST: u16 = 512;

/// Bus scans between cooperative yields inside one burst
const SCANS_PER_YIELD: u16 = 64;

const BLANK: u8 = 0xF;
const DIGIT_WEIGHTS: [u16; 3] = [100, 10, 1];

/// Latches digits from raw bus words
///
/// Kept separate from the pins so the decoding can be driven from any
/// source of bus words.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DigitBusDecoder {
    digits: [Option<u8>; 3],
}

impl DigitBusDecoder {
    pub const fn new() -> Self {
        Self { digits: [None; 3] }
    }

    /// Latch the nibble for every strobe that is high in `bus`
    ///
    /// Returns `true` if at least one strobe was high.
    pub fn observe(&mut self, bus: u8) -> bool {
        let nibble = bus & 0x0F;
        let mut strobed = false;
        for (i, digit) in self.digits.iter_mut().enumerate() {
            if (bus >> (4 + i)) & 1 == 1 {
                *digit = Some(nibble);
                strobed = true;
            }
        }
        strobed
    }

    /// Whether every digit has been latched at least once
    pub fn is_complete(&self) -> bool {
        self.digits.iter().all(Option::is_some)
    }

    /// Compose the displayed number
    ///
    /// Blank and not-yet-latched digits count as zero.
    pub fn value(&self) -> Result<u16, SensorError> {
        if self.digits.iter().all(Option::is_none) {
            return Err(SensorError::NotInitialized);
        }

        let mut value = 0;
        for (digit, weight) in self.digits.iter().zip(DIGIT_WEIGHTS) {
            match *digit {
                None | Some(BLANK) => {}
                Some(d @ 0..=9) => value += u16::from(d) * weight,
                Some(_) => return Err(SensorError::InvalidData),
            }
        }
        Ok(value)
    }

    /// Forget all latched digits
    pub fn clear(&mut self) {
        self.digits = [None; 3];
    }
}

/// Samples the gauge display through seven GPIO inputs
pub struct DigitBusSampler<P> {
    /// Data lines A, B, C, D
    data: [P; 4],
    /// Strobe lines L1, L2, L3
    strobes: [P; 3],
    decoder: DigitBusDecoder,
    /// Bus scans per sample
    burst: u16,
    sensor_id: SensorId,
    last_raw: Option<u16>,
}

impl<P: InputPin> DigitBusSampler<P> {
    /// Create a sampler for the primary gauge
    pub fn new(data: [P; 4], strobes: [P; 3]) -> Self {
        Self {
            data,
            strobes,
            decoder: DigitBusDecoder::new(),
            burst: DEFAULT_BURST,
            sensor_id: SensorId::WATER_LEVEL,
            last_raw: None,
        }
    }

    /// Use a different sensor slot
    pub fn with_sensor_id(mut self, sensor_id: SensorId) -> Self {
        self.sensor_id = sensor_id;
        self
    }

    /// Number of bus scans per `sample()` (at least one)
    pub fn with_burst(mut self, burst: u16) -> Self {
        self.burst = burst.max(1);
        self
    }

    pub fn decoder(&self) -> &DigitBusDecoder {
        &self.decoder
    }

    /// Read the seven lines into a bus word
    pub fn read_bus(&mut self) -> Result<u8, SensorError> {
        let mut bus = 0u8;
        for (bit, pin) in self.data.iter_mut().chain(self.strobes.iter_mut()).enumerate() {
            if pin.is_high().map_err(|_| SensorError::HardwareError)? {
                bus |= 1 << bit;
            }
        }
        Ok(bus)
    }

    /// Read the bus once and latch whatever digit is strobed
    pub fn scan(&mut self) -> Result<bool, SensorError> {
        let bus = self.read_bus()?;
        Ok(self.decoder.observe(bus))
    }
}

impl<P: InputPin> SamplerPort for DigitBusSampler<P> {
    /// Scan a burst and compose the displayed value
    ///
    /// Yields every 64 scans, so a read timeout around this call can cut a
    /// long burst short.
    async fn sample(&mut self) -> Result<f32, SensorError> {
        let mut strobed = false;
        let mut this_burst = DigitBusDecoder::new();

        for scan in 0..self.burst {
            if scan > 0 && scan % SCANS_PER_YIELD == 0 {
                yield_now().await;
            }

            let bus = self.read_bus()?;
            if self.decoder.observe(bus) {
                strobed = true;
                this_burst.observe(bus);
                if this_burst.is_complete() {
                    break;
                }
            }
        }

        if !strobed {
            if self.decoder.value().is_err() {
                return Err(SensorError::NotInitialized);
            }
            // Display went dark since the last cycle
            log::debug!("digit bus idle for a full burst");
            return Err(SensorError::Timeout);
        }

        let value = self.decoder.value()?;
        self.last_raw = Some(value);
        Ok(f32::from(value))
    }

    fn sensor_id(&self) -> SensorId {
        self.sensor_id
    }

    fn last_raw_value(&self) -> Option<u16> {
        self.last_raw
    }
}
