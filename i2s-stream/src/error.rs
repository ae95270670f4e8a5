//! Error types.
//!
//! Only construction can fail. Interrupt and foreground paths are infallible:
//! pool exhaustion, overruns and underruns are absorbed and counted in
//! [`StreamStats`](crate::stream::StreamStats).

/// Configuration rejected by [`StreamConfig::validate`](crate::config::StreamConfig::validate).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Sample rate is not a finite, positive number
    InvalidSampleRate,
    /// DC slew coefficient outside `0.0..1.0`
    InvalidSlewAlpha,
    /// Calibration window rounds to zero periods
    CalibrationWindowEmpty,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ConfigError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ConfigError::InvalidSampleRate => "invalid sample rate",
            ConfigError::InvalidSlewAlpha => "DC slew alpha must be in [0, 1)",
            ConfigError::CalibrationWindowEmpty => "calibration window is empty",
        }
    }
}

impl core::error::Error for ConfigError {}
