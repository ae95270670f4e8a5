//! DC-offset estimation and removal for captured input.
//!
//! Some codecs (the WM8731 in particular) deliver ADC data with a static
//! bias. The calibrator averages the first `window` periods of each channel,
//! then subtracts the rounded mean from everything that follows:
//!
//! ```text
//!   Accumulating ──(count == window)──► boundary block ──► Converged
//!   pass-through        sum += x         slew + subtract    subtract
//! ```
//!
//! On the boundary block the subtracted value follows
//! `smoothed = smoothed·α + offset·(1 − α)` once per sample, starting from 0.
//! With α = 0.85 and 128 samples, `smoothed` reaches `offset` before the
//! block ends, so the whole slew happens inside that one period. Later
//! blocks subtract the settled value with no further filtering.

use crate::constants::AUDIO_BLOCK_SAMPLES;

use super::saturate16;

/// Where the calibrator is in its single transition.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CalibrationState {
    /// Summing raw samples; `count` periods seen so far.
    Accumulating {
        count: u32,
        sum_left: i64,
        sum_right: i64,
    },
    /// Offsets fixed. Terminal until [`DcOffsetCalibrator::reset`].
    Converged {
        offset_left: i32,
        offset_right: i32,
        smoothed_left: f32,
        smoothed_right: f32,
    },
}

impl CalibrationState {
    pub const INITIAL: CalibrationState = CalibrationState::Accumulating {
        count: 0,
        sum_left: 0,
        sum_right: 0,
    };
}

/// Per-stream DC-offset calibrator for a stereo input.
#[derive(Debug, Clone)]
pub struct DcOffsetCalibrator {
    state: CalibrationState,
    window: u32,
    alpha: f32,
}

impl DcOffsetCalibrator {
    /// `window` is the number of periods averaged; `alpha` the slew
    /// coefficient.
    pub fn new(window: u32, alpha: f32) -> Self {
        debug_assert!(window > 0);
        DcOffsetCalibrator {
            state: CalibrationState::INITIAL,
            window,
            alpha,
        }
    }

    pub fn state(&self) -> &CalibrationState {
        &self.state
    }

    pub fn window(&self) -> u32 {
        self.window
    }

    pub fn is_converged(&self) -> bool {
        matches!(self.state, CalibrationState::Converged { .. })
    }

    /// Fixed offsets, once converged.
    pub fn offsets(&self) -> Option<(i32, i32)> {
        match self.state {
            CalibrationState::Converged {
                offset_left,
                offset_right,
                ..
            } => Some((offset_left, offset_right)),
            CalibrationState::Accumulating { .. } => None,
        }
    }

    /// Start a fresh calibration.
    pub fn reset(&mut self) {
        self.state = CalibrationState::INITIAL;
    }

    /// Process one captured pair in place.
    ///
    /// Returns `true` for the boundary block, where the offsets were fixed.
    pub fn process(
        &mut self,
        left: &mut [i16; AUDIO_BLOCK_SAMPLES],
        right: &mut [i16; AUDIO_BLOCK_SAMPLES],
    ) -> bool {
        match &mut self.state {
            CalibrationState::Accumulating {
                count,
                sum_left,
                sum_right,
            } if *count < self.window => {
                *sum_left += left.iter().map(|&s| s as i64).sum::<i64>();
                *sum_right += right.iter().map(|&s| s as i64).sum::<i64>();
                *count += 1;
                false
            }
            CalibrationState::Accumulating {
                count,
                sum_left,
                sum_right,
            } => {
                let offset_left = block_mean(*sum_left, *count);
                let offset_right = block_mean(*sum_right, *count);
                let (smoothed_left, smoothed_right) =
                    self.slew_in(left, right, offset_left, offset_right);
                self.state = CalibrationState::Converged {
                    offset_left,
                    offset_right,
                    smoothed_left,
                    smoothed_right,
                };
                true
            }
            CalibrationState::Converged {
                smoothed_left,
                smoothed_right,
                ..
            } => {
                subtract(left, *smoothed_left);
                subtract(right, *smoothed_right);
                false
            }
        }
    }

    fn slew_in(
        &self,
        left: &mut [i16; AUDIO_BLOCK_SAMPLES],
        right: &mut [i16; AUDIO_BLOCK_SAMPLES],
        offset_left: i32,
        offset_right: i32,
    ) -> (f32, f32) {
        let beta = 1.0 - self.alpha;
        let (mut smoothed_left, mut smoothed_right) = (0.0f32, 0.0f32);
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            smoothed_left = smoothed_left * self.alpha + offset_left as f32 * beta;
            smoothed_right = smoothed_right * self.alpha + offset_right as f32 * beta;
            *l = remove(*l, smoothed_left);
            *r = remove(*r, smoothed_right);
        }
        (smoothed_left, smoothed_right)
    }
}

fn block_mean(sum: i64, periods: u32) -> i32 {
    libm::round(sum as f64 / (periods as f64 * AUDIO_BLOCK_SAMPLES as f64)) as i32
}

#[inline(always)]
fn remove(sample: i16, offset: f32) -> i16 {
    saturate16(sample as i32 - libm::roundf(offset) as i32)
}

fn subtract(block: &mut [i16; AUDIO_BLOCK_SAMPLES], offset: f32) {
    for sample in block.iter_mut() {
        *sample = remove(*sample, offset);
    }
}
