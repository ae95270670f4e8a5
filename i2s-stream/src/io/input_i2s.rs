//! DMA-driven I2S stereo input.
//!
//! The receive path is split by execution context:
//!
//! - [`CaptureHandoff`] is shared with the RX DMA interrupt. Its
//!   [`isr()`](CaptureHandoff::isr) de-interleaves the settled half of the
//!   ring into the [`CaptureCursor`] blocks.
//! - [`AudioInputI2S`] is the foreground exchange. Once per period it swaps
//!   the filled pair for fresh blocks, removes DC offset and hands the pair
//!   to the graph.
//!
//! ## Architecture
//!
//! ```text
//! SAI1 RX           RingBuffer (DMAMEM)                CaptureCursor        Graph
//! ┌────────┐       ┌──────────┬──────────┐            ┌────────────┐
//! │ RDR[0] │──DMA─►│  Half A  │  Half B  │──deinterl─►│ left  [..] │─update─► capture_did_arrive
//! │        │       │ 64 × u32 │ 64 × u32 │───────────►│ right [..] │   (DC removed)
//! └────────┘       └──────────┴──────────┘            └────────────┘
//! ```
//!
//! Two interrupts fill one pair: the first writes samples `0..64`, the second
//! `64..128`. If the foreground has not collected a full pair by the next
//! interrupt, or never installed blocks, the half is dropped. The sample
//! clock is the master and cannot be stalled.

use core::sync::atomic::{AtomicBool, Ordering};

use crate::block::{AudioBlock, BlockPool};
use crate::constants::{AUDIO_BLOCK_SAMPLES, HALF_BLOCK_SAMPLES};
use crate::control::AudioControl;
use crate::dsp::DcOffsetCalibrator;
use crate::graph::{AudioGraph, PeriodTrigger};
use crate::hal::{CacheMaintenance, DmaChannel};
use crate::sync::IrqCell;

use super::interleave::deinterleave;
use super::ring::{DmaHalf, RingBuffer};

type BlockPair<'p> = (AudioBlock<'p>, AudioBlock<'p>);

/// The pair of blocks being filled by the receive interrupt.
#[derive(Debug, Default)]
pub struct CaptureCursor<'p> {
    block_left: Option<AudioBlock<'p>>,
    block_right: Option<AudioBlock<'p>>,
    /// Samples per channel already written: 0, 64 or 128.
    offset: usize,
}

impl<'p> CaptureCursor<'p> {
    pub const fn new() -> Self {
        CaptureCursor {
            block_left: None,
            block_right: None,
            offset: 0,
        }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn has_blocks(&self) -> bool {
        self.block_left.is_some() && self.block_right.is_some()
    }

    pub fn is_full(&self) -> bool {
        self.offset >= AUDIO_BLOCK_SAMPLES
    }

    /// Pool slots of the installed pair.
    pub fn slots(&self) -> (Option<u8>, Option<u8>) {
        (
            self.block_left.as_ref().map(AudioBlock::slot),
            self.block_right.as_ref().map(AudioBlock::slot),
        )
    }

    fn take(&mut self) -> (Option<AudioBlock<'p>>, Option<AudioBlock<'p>>) {
        self.offset = 0;
        (self.block_left.take(), self.block_right.take())
    }

    fn install(
        &mut self,
        pair: Option<BlockPair<'p>>,
    ) -> (Option<AudioBlock<'p>>, Option<AudioBlock<'p>>) {
        let (left, right) = match pair {
            Some((l, r)) => (Some(l), Some(r)),
            None => (None, None),
        };
        let old = (
            core::mem::replace(&mut self.block_left, left),
            core::mem::replace(&mut self.block_right, right),
        );
        self.offset = 0;
        old
    }
}

/// Receive-side counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CaptureStats {
    /// Completed pairs handed to the graph.
    pub periods: u32,
    /// Periods where a fresh pair could not be allocated.
    pub alloc_failures: u32,
    /// Halves dropped because no blocks were installed.
    pub starved_halves: u32,
    /// Halves dropped because the installed pair was already full.
    pub overrun_halves: u32,
}

struct CaptureState<'p> {
    cursor: CaptureCursor<'p>,
    starved_halves: u32,
    overrun_halves: u32,
}

impl<'p> CaptureState<'p> {
    const fn new() -> Self {
        CaptureState {
            cursor: CaptureCursor::new(),
            starved_halves: 0,
            overrun_halves: 0,
        }
    }

    /// Take the pair out of the cursor for one half-block copy, or count
    /// why the half is dropped.
    fn begin_fill(&mut self) -> Option<(BlockPair<'p>, usize)> {
        let cursor = &mut self.cursor;
        if !cursor.has_blocks() {
            self.starved_halves = self.starved_halves.wrapping_add(1);
            return None;
        }
        let offset = cursor.offset;
        if offset > AUDIO_BLOCK_SAMPLES - HALF_BLOCK_SAMPLES {
            self.overrun_halves = self.overrun_halves.wrapping_add(1);
            return None;
        }
        match cursor.take() {
            (Some(left), Some(right)) => Some(((left, right), offset)),
            _ => None,
        }
    }

    /// Put the pair back, `offset` now covering the copied half.
    fn end_fill(&mut self, (left, right): BlockPair<'p>, offset: usize) {
        let cursor = &mut self.cursor;
        cursor.block_left = Some(left);
        cursor.block_right = Some(right);
        cursor.offset = offset;
    }
}

/// Outcome of the masked swap in [`CaptureHandoff::exchange`].
enum Exchange<'p> {
    /// A full pair came out of the cursor.
    Completed(BlockPair<'p>),
    /// Blocks nobody needs; release them.
    Surplus(Option<AudioBlock<'p>>, Option<AudioBlock<'p>>),
}

/// Receive state shared between the RX DMA interrupt and the foreground.
pub struct CaptureHandoff<'p> {
    state: IrqCell<CaptureState<'p>>,
    enabled: AtomicBool,
    update_responsibility: bool,
}

impl<'p> CaptureHandoff<'p> {
    /// `update_responsibility`: this ISR advances the graph once per period.
    pub const fn new(update_responsibility: bool) -> Self {
        CaptureHandoff {
            state: IrqCell::new(CaptureState::new()),
            enabled: AtomicBool::new(true),
            update_responsibility,
        }
    }

    /// Handle a receive DMA half/major interrupt.
    ///
    /// Reads the engine's destination address to find the settled half,
    /// invalidates it from d-cache and de-interleaves it into the cursor.
    /// Only taking and returning the cursor pair is masked; the cache
    /// operation and the copy run with interrupts enabled. Returns `true` if
    /// `trigger` was invoked.
    pub fn isr<D, C, T>(
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
        let active = ring.active_half(dma.current_address());
        dma.clear_interrupt();

        if self.enabled.load(Ordering::Acquire) {
            let taken = self.state.with(|state| state.begin_fill());
            if let Some(((mut left, mut right), offset)) = taken {
                let src = ring.half(active.other());
                cache.invalidate(src);
                deinterleave(
                    src,
                    &mut left[offset..offset + HALF_BLOCK_SAMPLES],
                    &mut right[offset..offset + HALF_BLOCK_SAMPLES],
                );
                let filled = offset + HALF_BLOCK_SAMPLES;
                self.state.with(|state| state.end_fill((left, right), filled));
            }
        }

        // DMA back in the first half: the second half, and with it the
        // period, has just completed.
        let should_update = self.update_responsibility && active == DmaHalf::First;
        if should_update {
            trigger.advance_period();
        }
        should_update
    }

    pub fn has_update_responsibility(&self) -> bool {
        self.update_responsibility
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Inspect the cursor under the interrupt mask.
    pub fn with_cursor<R>(&self, f: impl FnOnce(&CaptureCursor<'p>) -> R) -> R {
        self.state.with_ref(|state| f(&state.cursor))
    }

    fn exchange(&self, fresh: Option<BlockPair<'p>>) -> Exchange<'p> {
        self.state.with(|state| {
            let cursor = &mut state.cursor;
            if cursor.is_full() {
                match cursor.install(fresh) {
                    (Some(left), Some(right)) => Exchange::Completed((left, right)),
                    (left, right) => Exchange::Surplus(left, right),
                }
            } else if let Some(pair) = fresh {
                if cursor.has_blocks() {
                    Exchange::Surplus(Some(pair.0), Some(pair.1))
                } else {
                    let (left, right) = cursor.install(Some(pair));
                    Exchange::Surplus(left, right)
                }
            } else {
                Exchange::Surplus(None, None)
            }
        })
    }

    fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
    }

    fn clear(&self) -> (Option<AudioBlock<'p>>, Option<AudioBlock<'p>>) {
        self.state.with(|state| state.cursor.take())
    }

    fn isr_counters(&self) -> (u32, u32) {
        self.state
            .with_ref(|state| (state.starved_halves, state.overrun_halves))
    }
}

/// Foreground half of the stereo input: the per-period block exchange.
///
/// Graph-facing equivalent of the Teensy `AudioInputI2S` node with 0 inputs
/// and 2 outputs, delivered through [`AudioGraph::capture_did_arrive`].
pub struct AudioInputI2S<'c, 'p> {
    pool: &'p BlockPool,
    handoff: &'c CaptureHandoff<'p>,
    calibrator: DcOffsetCalibrator,
    remove_dc_offset: bool,
    periods: u32,
    alloc_failures: u32,
}

impl<'c, 'p> AudioInputI2S<'c, 'p> {
    pub fn new(
        pool: &'p BlockPool,
        handoff: &'c CaptureHandoff<'p>,
        calibrator: DcOffsetCalibrator,
        remove_dc_offset: bool,
    ) -> Self {
        AudioInputI2S {
            pool,
            handoff,
            calibrator,
            remove_dc_offset,
            periods: 0,
            alloc_failures: 0,
        }
    }

    /// Run one period of the input exchange.
    ///
    /// Allocation and DC removal happen outside the interrupt mask; only the
    /// cursor swap is masked.
    pub fn update<G: AudioGraph<'p>>(&mut self, graph: &mut G) {
        if !self.handoff.is_enabled() {
            return;
        }

        let fresh = self.allocate_pair();
        match self.handoff.exchange(fresh) {
            Exchange::Completed((mut left, mut right)) => {
                if self.remove_dc_offset && self.calibrator.process(&mut left, &mut right) {
                    self.log_calibrated();
                }
                self.periods = self.periods.wrapping_add(1);
                graph.capture_did_arrive(left, right);
            }
            Exchange::Surplus(left, right) => {
                self.pool.release(left);
                self.pool.release(right);
            }
        }
    }

    fn log_calibrated(&self) {
        #[cfg(feature = "defmt")]
        if let Some((l, r)) = self.calibrator.offsets() {
            defmt::info!("DC offset calibrated: left={} right={}", l, r);
        }
    }

    /// Both blocks or neither.
    fn allocate_pair(&mut self) -> Option<BlockPair<'p>> {
        let pair = self
            .pool
            .allocate()
            .and_then(|left| self.pool.allocate().map(|right| (left, right)));
        if pair.is_none() {
            self.alloc_failures = self.alloc_failures.wrapping_add(1);
            #[cfg(feature = "defmt")]
            defmt::warn!("capture: block pool exhausted, skipping period");
        }
        pair
    }

    pub fn pool(&self) -> &'p BlockPool {
        self.pool
    }

    pub fn calibrator(&self) -> &DcOffsetCalibrator {
        &self.calibrator
    }

    pub fn handoff(&self) -> &'c CaptureHandoff<'p> {
        self.handoff
    }

    pub fn stats(&self) -> CaptureStats {
        let (starved_halves, overrun_halves) = self.handoff.isr_counters();
        CaptureStats {
            periods: self.periods,
            alloc_failures: self.alloc_failures,
            starved_halves,
            overrun_halves,
        }
    }
}

impl AudioControl for AudioInputI2S<'_, '_> {
    /// Resume capture. Coming back from disabled starts a fresh DC
    /// calibration; enabling a running input changes nothing.
    fn enable(&mut self) {
        if !self.handoff.is_enabled() {
            self.calibrator.reset();
        }
        self.handoff.set_enabled(true);
        #[cfg(feature = "defmt")]
        defmt::info!("capture enabled");
    }

    /// Stop capture, release the cursor blocks and reset calibration.
    fn disable(&mut self) {
        self.handoff.set_enabled(false);
        let (left, right) = self.handoff.clear();
        self.pool.release(left);
        self.pool.release(right);
        self.calibrator.reset();
        #[cfg(feature = "defmt")]
        defmt::info!("capture disabled");
    }

    fn is_enabled(&self) -> bool {
        self.handoff.is_enabled()
    }
}
