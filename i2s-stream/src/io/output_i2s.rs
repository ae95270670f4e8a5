//! DMA-driven I2S stereo output.
//!
//! [`AudioOutputI2S`] pulls one block per channel from the graph each period
//! and queues it on the [`PlaybackHandoff`]. The TX DMA interrupt drains the
//! queues half a block at a time into whichever ring half the engine is not
//! reading.
//!
//! ## Architecture
//!
//! ```text
//! Graph                     PlaybackQueue ×2              RingBuffer (DMAMEM)       SAI1 TX
//!                           ┌──────────────┐            ┌──────────┬──────────┐    ┌────────┐
//! playback_wants_data ─────►│ current next │─interleave►│  Half A  │  Half B  │─DMA►│ TDR[0] │
//!   (L, R)                  │ offset       │            │ 64 × u32 │ 64 × u32 │    │        │
//!                           └──────────────┘            └──────────┴──────────┘    └────────┘
//! ```
//!
//! ## Queue policy
//!
//! Each channel holds at most two blocks: `current`, being drained, and
//! `next`. Enqueueing a third block drops `current` and promotes `next`.
//! When a channel has nothing queued the interrupt writes zeros for it, so
//! the link always carries a valid stream.

use core::sync::atomic::{AtomicBool, Ordering};

use crate::block::{AudioBlock, BlockPool};
use crate::constants::{AUDIO_BLOCK_SAMPLES, HALF_BLOCK_SAMPLES};
use crate::control::AudioControl;
use crate::graph::{AudioGraph, Channel, PeriodTrigger};
use crate::hal::{CacheMaintenance, DmaChannel};
use crate::sync::IrqCell;

use super::interleave::{interleave_lr, interleave_mono, silence};
use super::ring::{DmaHalf, RingBuffer};

/// A block out of its queue for the duration of one copy, with its offset.
type Draining<'p> = Option<(AudioBlock<'p>, usize)>;

/// Samples of a draining block that go out in this half.
fn window<'a>(draining: &'a Draining<'_>) -> Option<&'a [i16]> {
    draining
        .as_ref()
        .map(|(block, offset)| &block[*offset..*offset + HALF_BLOCK_SAMPLES])
}

/// Two-deep playback queue for one channel.
#[derive(Debug, Default)]
pub struct PlaybackQueue<'p> {
    current: Option<AudioBlock<'p>>,
    next: Option<AudioBlock<'p>>,
    /// Samples of `current` already transmitted.
    offset: usize,
}

impl<'p> PlaybackQueue<'p> {
    pub const fn new() -> Self {
        PlaybackQueue {
            current: None,
            next: None,
            offset: 0,
        }
    }

    /// Queue `block`, returning the block displaced by an overrun.
    pub fn enqueue(&mut self, block: AudioBlock<'p>) -> Option<AudioBlock<'p>> {
        if self.current.is_none() {
            self.current = Some(block);
            self.offset = 0;
            None
        } else if self.next.is_none() {
            self.next = Some(block);
            None
        } else {
            let dropped = core::mem::replace(&mut self.current, self.next.take());
            self.next = Some(block);
            self.offset = 0;
            dropped
        }
    }

    /// The next half-block of `current` to transmit.
    pub fn pending(&self) -> Option<&[i16]> {
        self.current
            .as_ref()
            .map(|block| &block[self.offset..self.offset + HALF_BLOCK_SAMPLES])
    }

    /// Take `current` and its drain offset out for one half-block copy.
    fn take_current(&mut self) -> Draining<'p> {
        self.current.take().map(|block| (block, self.offset))
    }

    /// Put back a block from [`take_current`](Self::take_current), one half
    /// further on. Once fully drained it is returned instead and `next` is
    /// promoted.
    fn return_current(&mut self, draining: Draining<'p>) -> Option<AudioBlock<'p>> {
        let (block, offset) = draining?;
        let offset = offset + HALF_BLOCK_SAMPLES;
        if offset < AUDIO_BLOCK_SAMPLES {
            self.current = Some(block);
            self.offset = offset;
            None
        } else {
            self.current = self.next.take();
            self.offset = 0;
            Some(block)
        }
    }

    /// Empty the queue, returning `[current, next]`.
    pub fn clear(&mut self) -> [Option<AudioBlock<'p>>; 2] {
        self.offset = 0;
        [self.current.take(), self.next.take()]
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn len(&self) -> usize {
        self.current.is_some() as usize + self.next.is_some() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_none()
    }

    /// Pool slots of `[current, next]`.
    pub fn slots(&self) -> [Option<u8>; 2] {
        [
            self.current.as_ref().map(AudioBlock::slot),
            self.next.as_ref().map(AudioBlock::slot),
        ]
    }
}

/// Transmit-side counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PlaybackStats {
    /// Blocks dropped by the drop-oldest policy.
    pub overruns: u32,
    /// Halves transmitted as silence because both queues were empty.
    pub silent_halves: u32,
}

struct PlaybackState<'p> {
    queues: [PlaybackQueue<'p>; 2],
    silent_halves: u32,
}

impl<'p> PlaybackState<'p> {
    const fn new() -> Self {
        PlaybackState {
            queues: [PlaybackQueue::new(), PlaybackQueue::new()],
            silent_halves: 0,
        }
    }

    fn begin_drain(&mut self) -> [Draining<'p>; 2] {
        let [left, right] = &mut self.queues;
        [left.take_current(), right.take_current()]
    }

    fn end_drain(
        &mut self,
        [l, r]: [Draining<'p>; 2],
        silent: bool,
    ) -> [Option<AudioBlock<'p>>; 2] {
        if silent {
            self.silent_halves = self.silent_halves.wrapping_add(1);
        }
        let [left, right] = &mut self.queues;
        [left.return_current(l), right.return_current(r)]
    }
}

/// Transmit state shared between the TX DMA interrupt and the foreground.
pub struct PlaybackHandoff<'p> {
    state: IrqCell<PlaybackState<'p>>,
    enabled: AtomicBool,
    update_responsibility: bool,
}

impl<'p> PlaybackHandoff<'p> {
    /// `update_responsibility`: this ISR advances the graph once per period.
    pub const fn new(update_responsibility: bool) -> Self {
        PlaybackHandoff {
            state: IrqCell::new(PlaybackState::new()),
            enabled: AtomicBool::new(true),
            update_responsibility,
        }
    }

    /// Handle a transmit DMA half/major interrupt.
    ///
    /// Refills the half the engine is not reading from the channel queues,
    /// flushes it to memory and retires drained blocks. The blocks being
    /// drained leave their queues under the mask, are copied with interrupts
    /// enabled, and go back under a second mask. Returns `true` if `trigger`
    /// was invoked.
    pub fn isr<D, C, T>(
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
        let active = ring.active_half(dma.current_address());
        dma.clear_interrupt();

        let dest = ring.half_mut(active.other());
        if self.enabled.load(Ordering::Acquire) {
            let draining = self.state.with(|state| state.begin_drain());
            let silent = match (window(&draining[0]), window(&draining[1])) {
                (Some(l), Some(r)) => {
                    interleave_lr(dest, l, r);
                    false
                }
                (Some(l), None) => {
                    interleave_mono(dest, l, Channel::Left);
                    false
                }
                (None, Some(r)) => {
                    interleave_mono(dest, r, Channel::Right);
                    false
                }
                (None, None) => {
                    silence(dest);
                    true
                }
            };
            cache.flush_invalidate(dest);
            let retired = self.state.with(|state| state.end_drain(draining, silent));
            // The pool is lock-free; drained blocks go back outside the mask.
            drop(retired);
        } else {
            silence(dest);
            cache.flush_invalidate(dest);
        }

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

    /// Queue `block` on `channel` under the interrupt mask, returning the
    /// block displaced by an overrun. The caller releases it.
    pub fn enqueue(&self, channel: Channel, block: AudioBlock<'p>) -> Option<AudioBlock<'p>> {
        self.state
            .with(|state| state.queues[channel.index()].enqueue(block))
    }

    /// Inspect one channel's queue under the interrupt mask.
    pub fn with_queue<R>(&self, channel: Channel, f: impl FnOnce(&PlaybackQueue<'p>) -> R) -> R {
        self.state.with_ref(|state| f(&state.queues[channel.index()]))
    }

    fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
    }

    fn clear(&self) -> [[Option<AudioBlock<'p>>; 2]; 2] {
        self.state
            .with(|state| [state.queues[0].clear(), state.queues[1].clear()])
    }

    fn silent_halves(&self) -> u32 {
        self.state.with_ref(|state| state.silent_halves)
    }
}

/// Foreground half of the stereo output: the per-period enqueue.
pub struct AudioOutputI2S<'c, 'p> {
    pool: &'p BlockPool,
    handoff: &'c PlaybackHandoff<'p>,
    overruns: u32,
}

impl<'c, 'p> AudioOutputI2S<'c, 'p> {
    pub fn new(pool: &'p BlockPool, handoff: &'c PlaybackHandoff<'p>) -> Self {
        AudioOutputI2S {
            pool,
            handoff,
            overruns: 0,
        }
    }

    /// Pull at most one block per channel from the graph and queue it.
    pub fn update<G: AudioGraph<'p>>(&mut self, graph: &mut G) {
        if !self.handoff.is_enabled() {
            return;
        }

        for channel in Channel::ALL {
            let Some(block) = graph.playback_wants_data(channel) else {
                continue;
            };
            let dropped = self.handoff.enqueue(channel, block);
            if dropped.is_some() {
                self.overruns = self.overruns.wrapping_add(1);
            }
            self.pool.release(dropped);
        }
    }

    pub fn handoff(&self) -> &'c PlaybackHandoff<'p> {
        self.handoff
    }

    pub fn stats(&self) -> PlaybackStats {
        PlaybackStats {
            overruns: self.overruns,
            silent_halves: self.handoff.silent_halves(),
        }
    }
}

impl AudioControl for AudioOutputI2S<'_, '_> {
    fn enable(&mut self) {
        self.handoff.set_enabled(true);
        #[cfg(feature = "defmt")]
        defmt::info!("playback enabled");
    }

    /// Stop playback and release every queued block.
    fn disable(&mut self) {
        self.handoff.set_enabled(false);
        for blocks in self.handoff.clear() {
            for block in blocks {
                self.pool.release(block);
            }
        }
        #[cfg(feature = "defmt")]
        defmt::info!("playback disabled");
    }

    fn is_enabled(&self) -> bool {
        self.handoff.is_enabled()
    }
}
