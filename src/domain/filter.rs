//! Noise filter for raw samples
//!
//! Two smoothing modes are available: an exponential moving average and a
//! running median. Both keep bounded state and never allocate.

use heapless::HistoryBuffer;
use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// Number of filtered values kept for fault detection
pub const HISTORY_CAPACITY: usize = 32;

/// Largest supported median window
pub const MAX_MEDIAN_WINDOW: usize = 16;

/// EMA weight that responds over about five samples (2 / (5 + 1))
pub const DEFAULT_ALPHA: f32 = 1.0 / 3.0;

/// Smoothing function applied to every raw sample
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FilterMode {
    /// `filtered = alpha * raw + (1 - alpha) * last_filtered`
    Ema { alpha: f32 },
    /// Median of the last `window` raw samples
    Median { window: u8 },
}

impl FilterMode {
    /// Pass raw samples through untouched
    pub const PASSTHROUGH: Self = FilterMode::Ema { alpha: 1.0 };

    /// Check the mode parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            FilterMode::Ema { alpha } if alpha > 0.0 && alpha <= 1.0 => Ok(()),
            FilterMode::Median { window } if window >= 1 && usize::from(window) <= MAX_MEDIAN_WINDOW => {
                Ok(())
            }
            _ => Err(ConfigError::InvalidFilter),
        }
    }
}

impl Default for FilterMode {
    fn default() -> Self {
        FilterMode::Ema {
            alpha: DEFAULT_ALPHA,
        }
    }
}

/// Mutable filter state, persisted for the device's uptime
#[derive(Clone, Debug)]
pub struct FilterState {
    /// Output of the previous `update`, `None` before the first sample
    pub last_filtered: Option<f32>,
    /// Filtered outputs, newest last
    pub history: HistoryBuffer<f32, HISTORY_CAPACITY>,
    /// Raw samples for the median window
    window: HistoryBuffer<f32, MAX_MEDIAN_WINDOW>,
}

impl FilterState {
    pub const fn new() -> Self {
        Self {
            last_filtered: None,
            history: HistoryBuffer::new(),
            window: HistoryBuffer::new(),
        }
    }
}

impl Default for FilterState {
    fn default() -> Self {
        Self::new()
    }
}

/// Smoothing stage of the pipeline
#[derive(Clone, Debug)]
pub struct Filter {
    mode: FilterMode,
    state: FilterState,
}

impl Filter {
    /// Create a filter, rejecting invalid mode parameters
    pub fn new(mode: FilterMode) -> Result<Self, ConfigError> {
        mode.validate()?;
        Ok(Self {
            mode,
            state: FilterState::new(),
        })
    }

    pub fn mode(&self) -> FilterMode {
        self.mode
    }

    /// Filtered values seen so far, oldest first
    pub fn history(&self) -> &HistoryBuffer<f32, HISTORY_CAPACITY> {
        &self.state.history
    }

    pub fn last_filtered(&self) -> Option<f32> {
        self.state.last_filtered
    }

    /// Feed one raw sample and return the smoothed value
    ///
    /// The first sample is returned as-is so there is no warm-up bias.
    pub fn update(&mut self, raw: f32) -> f32 {
        let filtered = match self.mode {
            FilterMode::Ema { alpha } => match self.state.last_filtered {
                None => raw,
                Some(last) => alpha * raw + (1.0 - alpha) * last,
            },
            FilterMode::Median { window } => {
                self.state.window.write(raw);
                median_of_recent(&self.state.window, usize::from(window))
            }
        };

        self.state.last_filtered = Some(filtered);
        self.state.history.write(filtered);
        filtered
    }

    /// Forget all samples
    pub fn reset(&mut self) {
        self.state = FilterState::new();
    }
}

/// Median of the newest `count` entries of `buf`
fn median_of_recent(buf: &HistoryBuffer<f32, MAX_MEDIAN_WINDOW>, count: usize) -> f32 {
    let len = buf.len();
    let take = count.min(len);

    let mut scratch = [0.0f32; MAX_MEDIAN_WINDOW];
    for (slot, value) in scratch.iter_mut().zip(buf.oldest_ordered().skip(len - take)) {
        *slot = *value;
    }

    let Some(values) = scratch.get_mut(..take) else {
        return 0.0;
    };
    values.sort_unstable_by(f32::total_cmp);

    let mid = take / 2;
    match (values.get(mid), mid.checked_sub(1).and_then(|i| values.get(i))) {
        (Some(&hi), Some(&lo)) if take % 2 == 0 => (lo + hi) / 2.0,
        (Some(&m), _) => m,
        // Only reachable with an empty buffer, which `update` never passes
        (None, _) => 0.0,
    }
}
