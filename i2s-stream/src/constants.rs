/// Number of 16-bit samples per channel in one processing period.
pub const AUDIO_BLOCK_SAMPLES: usize = 128;

/// Samples per channel moved by one DMA half-buffer interrupt.
pub const HALF_BLOCK_SAMPLES: usize = AUDIO_BLOCK_SAMPLES / 2;

/// Packed stereo frames held by one DMA ring buffer (two halves).
pub const RING_BUFFER_FRAMES: usize = AUDIO_BLOCK_SAMPLES;

/// Number of audio blocks in a [`BlockPool`](crate::block::BlockPool).
pub const POOL_SIZE: usize = 32;

/// Exact audio sample rate in Hz (matches Teensy hardware PLL configuration).
pub const AUDIO_SAMPLE_RATE_EXACT: f32 = 44_117.647;

/// Seconds of input averaged before the DC offset is fixed.
pub const DC_CALIBRATION_SECONDS: f32 = 2.0;

/// Default one-pole slew coefficient applied while the DC offset settles.
pub const DEFAULT_DC_SLEW_ALPHA: f32 = 0.85;

const _: () = assert!(AUDIO_BLOCK_SAMPLES % 2 == 0);
const _: () = assert!(POOL_SIZE <= 32, "pool bitmap is a single u32");
