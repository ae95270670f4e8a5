//! # i2s-stream
//!
//! A `no_std`, zero-allocation block exchange between a circular I2S DMA
//! stream and a block-based audio graph, for Cortex-M parts such as the
//! [Teensy 4.x](https://www.pjrc.com/teensy/) (i.MX RT1062). Captured audio
//! is de-interleaved into pool blocks, DC-corrected and handed to the graph;
//! graph output is queued and interleaved back into the transmit ring.
//!
//! ## Architecture
//!
//! | Layer | Module | Purpose |
//! |-------|--------|---------|
//! | Memory | [`block`] | Fixed pool of move-only audio blocks |
//! | Sync | [`sync`] | Interrupt-masked cell for ISR-shared state |
//! | Hardware | [`hal`] | DMA channel and d-cache seams |
//! | I/O | [`io`] | Ring buffers, capture and playback handoffs |
//! | DSP | [`dsp`] | DC-offset calibration |
//! | Graph | [`graph`] | The graph boundary and period trigger |
//! | Stream | [`stream`] | The shared context, stream handle and ISR entry points |
//!
//! ## Quick start
//!
//! ```ignore
//! use i2s_stream::prelude::*;
//!
//! static POOL: BlockPool = BlockPool::new();
//!
//! let ctx = AudioContext::new(&POOL, StreamConfig::default())?;
//! let mut stream = ctx.stream().unwrap();
//!
//! // In the DMA interrupts:
//! ctx.rx_isr(&mut rx_dma, &RX_RING, &mut cache, &mut || {});
//! ctx.tx_isr(&mut tx_dma, &mut TX_RING, &mut cache, &mut || pend_update());
//!
//! // Once per period, in the task the trigger pends:
//! stream.update(&mut graph);
//! ```
//!
//! ## Features
//!
//! | Feature | Default | Enables |
//! |---------|---------|---------|
//! | `defmt` | no | Foreground logging and `defmt::Format` on public types |
//! | `cortex-m` | no | [`ScbCacheMaintenance`](hal::ScbCacheMaintenance) for the M7 d-cache |
//!
//! A `critical-section` implementation must be linked in, usually through
//! the HAL or `cortex-m/critical-section-single-core`.
//!
//! ## Audio parameters
//!
//! - **Block size:** 128 samples ([`constants::AUDIO_BLOCK_SAMPLES`])
//! - **Sample rate:** 44 117.647 Hz default ([`constants::AUDIO_SAMPLE_RATE_EXACT`])
//! - **Sample format:** `i16` (signed 16-bit)
//! - **Block pool:** 32 blocks ([`constants::POOL_SIZE`])

#![no_std]

pub mod constants;
pub mod block;
pub mod sync;
pub mod hal;
pub mod config;
pub mod error;
pub mod control;
pub mod graph;
pub mod dsp;
pub mod io;
pub mod stream;

#[cfg(test)]
mod test_utils;

/// Everything needed to wire a stream into an application.
pub mod prelude {
    pub use crate::block::{AudioBlock, BlockPool};
    pub use crate::config::{StreamConfig, UpdateDriver};
    pub use crate::control::AudioControl;
    pub use crate::error::ConfigError;
    pub use crate::graph::{AudioGraph, Channel, PeriodTrigger};
    pub use crate::hal::{CacheMaintenance, DmaChannel, NoCacheMaintenance};
    pub use crate::io::{DmaHalf, RingBuffer};
    pub use crate::stream::{AudioContext, AudioStream, StreamStats};
}
