//! Stream assembly: one capture and one playback direction sharing a pool.
//!
//! [`AudioContext`] is built once at startup and shared by reference. The
//! DMA interrupts call [`rx_isr()`](AudioContext::rx_isr) and
//! [`tx_isr()`](AudioContext::tx_isr); the scheduler that receives the period
//! trigger runs [`AudioStream::update`].
//!
//! ```ignore
//! static POOL: BlockPool = BlockPool::new();
//!
//! let ctx = AudioContext::new(&POOL, StreamConfig::default())?;
//! let mut stream = ctx.stream().unwrap();
//!
//! // DMA_TX interrupt
//! ctx.tx_isr(&mut tx_dma, &mut TX_RING, &mut cache, &mut || pend_audio_task());
//! // DMA_RX interrupt
//! ctx.rx_isr(&mut rx_dma, &RX_RING, &mut cache, &mut || {});
//!
//! // audio task, once per period
//! stream.update(&mut graph);
//! ```

use core::sync::atomic::{AtomicBool, Ordering};

use crate::block::{BlockPool, PoolStats};
use crate::config::{StreamConfig, UpdateDriver};
use crate::control::AudioControl;
use crate::dsp::DcOffsetCalibrator;
use crate::error::ConfigError;
use crate::graph::{AudioGraph, PeriodTrigger};
use crate::hal::{CacheMaintenance, DmaChannel};
use crate::io::{
    AudioInputI2S, AudioOutputI2S, CaptureHandoff, CaptureStats, PlaybackHandoff, PlaybackStats,
    RingBuffer,
};

/// Counters for the whole stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StreamStats {
    pub capture: CaptureStats,
    pub playback: PlaybackStats,
    pub pool: PoolStats,
}

/// Interrupt-shared state of a full-duplex I2S stream.
pub struct AudioContext<'p> {
    pool: &'p BlockPool,
    capture: CaptureHandoff<'p>,
    playback: PlaybackHandoff<'p>,
    config: StreamConfig,
    stream_taken: AtomicBool,
}

impl<'p> AudioContext<'p> {
    pub fn new(pool: &'p BlockPool, config: StreamConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        #[cfg(feature = "defmt")]
        defmt::info!(
            "audio context: {} Hz, DC window {} periods, driver {}",
            config.sample_rate_hz,
            config.calibration_window(),
            config.update_driver
        );

        Ok(AudioContext {
            pool,
            capture: CaptureHandoff::new(config.update_driver == UpdateDriver::Capture),
            playback: PlaybackHandoff::new(config.update_driver == UpdateDriver::Playback),
            config,
            stream_taken: AtomicBool::new(false),
        })
    }

    /// The foreground side of the stream. `None` after the first call.
    pub fn stream(&self) -> Option<AudioStream<'_, 'p>> {
        if self.stream_taken.swap(true, Ordering::AcqRel) {
            return None;
        }
        let calibrator =
            DcOffsetCalibrator::new(self.config.calibration_window(), self.config.dc_slew_alpha);
        Some(AudioStream {
            input: AudioInputI2S::new(
                self.pool,
                &self.capture,
                calibrator,
                self.config.remove_dc_offset,
            ),
            output: AudioOutputI2S::new(self.pool, &self.playback),
        })
    }

    /// Receive DMA interrupt entry point.
    pub fn rx_isr<D, C, T>(
        &self,
        dma: &mut D,
        ring: &RingBuffer,
        cache: &mut C,
        trigger: &mut T,
    ) -> bool
    where
        D: DmaChannel,
        C: CacheMaintenance,
        T: PeriodTrigger,
    {
        self.capture.isr(dma, ring, cache, trigger)
    }

    /// Transmit DMA interrupt entry point.
    pub fn tx_isr<D, C, T>(
        &self,
        dma: &mut D,
        ring: &mut RingBuffer,
        cache: &mut C,
        trigger: &mut T,
    ) -> bool
    where
        D: DmaChannel,
        C: CacheMaintenance,
        T: PeriodTrigger,
    {
        self.playback.isr(dma, ring, cache, trigger)
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    pub fn pool(&self) -> &'p BlockPool {
        self.pool
    }

    pub fn capture(&self) -> &CaptureHandoff<'p> {
        &self.capture
    }

    pub fn playback(&self) -> &PlaybackHandoff<'p> {
        &self.playback
    }
}

/// Foreground exchange for both directions, run once per period.
pub struct AudioStream<'c, 'p> {
    input: AudioInputI2S<'c, 'p>,
    output: AudioOutputI2S<'c, 'p>,
}

impl<'c, 'p> AudioStream<'c, 'p> {
    /// Deliver the completed capture pair, then queue the next playback
    /// blocks.
    pub fn update<G: AudioGraph<'p>>(&mut self, graph: &mut G) {
        self.input.update(graph);
        self.output.update(graph);
    }

    pub fn input(&mut self) -> &mut AudioInputI2S<'c, 'p> {
        &mut self.input
    }

    pub fn output(&mut self) -> &mut AudioOutputI2S<'c, 'p> {
        &mut self.output
    }

    pub fn stats(&self) -> StreamStats {
        StreamStats {
            capture: self.input.stats(),
            playback: self.output.stats(),
            pool: self.input.pool().stats(),
        }
    }
}

impl AudioControl for AudioStream<'_, '_> {
    fn enable(&mut self) {
        self.input.enable();
        self.output.enable();
    }

    fn disable(&mut self) {
        self.input.disable();
        self.output.disable();
    }

    /// Both directions are running.
    fn is_enabled(&self) -> bool {
        self.input.is_enabled() && self.output.is_enabled()
    }
}
