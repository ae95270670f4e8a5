//! DMA-driven I2S capture and playback.
//!
//! Each direction is split into an interrupt-shared handoff and a foreground
//! exchange that runs once per period:
//!
//! | Direction | ISR half | Foreground half | Graph call |
//! |-----------|----------|-----------------|------------|
//! | Capture | [`CaptureHandoff`] | [`AudioInputI2S`] | `capture_did_arrive(L, R)` |
//! | Playback | [`PlaybackHandoff`] | [`AudioOutputI2S`] | `playback_wants_data(ch)` |
//!
//! ## Utilities
//!
//! - [`interleave`]: packed stereo frame conversion
//! - [`ring`]: the DMA ring buffer and its halves
//!
//! ## DMA Buffer Layout
//!
//! Both directions use a circular [`RingBuffer`] of `AUDIO_BLOCK_SAMPLES`
//! `u32` frames:
//! - Each `u32` = one stereo frame (left in lower 16 bits, right in upper 16)
//! - The ring is split into two halves of 64 frames
//! - DMA fires half-complete and complete interrupts
//! - The ISR reads or fills the settled half while DMA works on the other

pub mod input_i2s;
pub mod interleave;
pub mod output_i2s;
pub mod ring;

pub use input_i2s::{AudioInputI2S, CaptureCursor, CaptureHandoff, CaptureStats};
pub use output_i2s::{AudioOutputI2S, PlaybackHandoff, PlaybackQueue, PlaybackStats};
pub use ring::{DmaHalf, RingBuffer};

#[cfg(test)]
mod integration_tests;
