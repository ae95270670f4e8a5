//! Stream configuration.
//!
//! The period length is fixed at build time by
//! [`AUDIO_BLOCK_SAMPLES`]; everything else is chosen when the
//! [`AudioContext`](crate::stream::AudioContext) is built.

use crate::constants::{
    AUDIO_BLOCK_SAMPLES, AUDIO_SAMPLE_RATE_EXACT, DC_CALIBRATION_SECONDS, DEFAULT_DC_SLEW_ALPHA,
};
use crate::error::ConfigError;

/// Which DMA interrupt advances the audio graph.
///
/// Exactly one direction drives the scheduler so the graph runs once per
/// hardware period even when both directions are streaming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UpdateDriver {
    /// The receive ISR triggers each period.
    Capture,
    /// The transmit ISR triggers each period.
    #[default]
    Playback,
}

/// Runtime parameters for one capture/playback stream.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StreamConfig {
    /// Frame rate of the I2S link in Hz.
    pub sample_rate_hz: f32,
    /// One-pole coefficient used while the DC offset slews in.
    pub dc_slew_alpha: f32,
    /// Estimate and subtract each input channel's DC offset.
    pub remove_dc_offset: bool,
    /// Direction whose ISR advances the graph.
    pub update_driver: UpdateDriver,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: AUDIO_SAMPLE_RATE_EXACT,
            dc_slew_alpha: DEFAULT_DC_SLEW_ALPHA,
            remove_dc_offset: true,
            update_driver: UpdateDriver::default(),
        }
    }
}

impl StreamConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sample_rate(mut self, hz: f32) -> Self {
        self.sample_rate_hz = hz;
        self
    }

    pub fn with_dc_slew_alpha(mut self, alpha: f32) -> Self {
        self.dc_slew_alpha = alpha;
        self
    }

    pub fn with_dc_removal(mut self, enabled: bool) -> Self {
        self.remove_dc_offset = enabled;
        self
    }

    pub fn with_update_driver(mut self, driver: UpdateDriver) -> Self {
        self.update_driver = driver;
        self
    }

    /// Periods averaged before the DC offset is fixed.
    pub fn calibration_window(&self) -> u32 {
        calibration_window(self.sample_rate_hz, AUDIO_BLOCK_SAMPLES)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.sample_rate_hz.is_finite() || self.sample_rate_hz <= 0.0 {
            return Err(ConfigError::InvalidSampleRate);
        }
        if !(0.0..1.0).contains(&self.dc_slew_alpha) {
            return Err(ConfigError::InvalidSlewAlpha);
        }
        if self.calibration_window() == 0 {
            return Err(ConfigError::CalibrationWindowEmpty);
        }
        Ok(())
    }
}

/// `round(DC_CALIBRATION_SECONDS × sample_rate / samples_per_period)`.
pub fn calibration_window(sample_rate_hz: f32, samples_per_period: usize) -> u32 {
    let periods = DC_CALIBRATION_SECONDS * sample_rate_hz / samples_per_period as f32;
    libm::roundf(periods) as u32
}
