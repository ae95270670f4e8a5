//! Host-side fakes for the hardware and graph boundaries.

use crate::block::{AudioBlock, BlockPool};
use crate::constants::{AUDIO_BLOCK_SAMPLES, POOL_SIZE};
use crate::graph::{AudioGraph, Channel};
use crate::hal::{CacheMaintenance, DmaChannel};
use crate::io::{DmaHalf, RingBuffer};

/// DMA channel parked at a fixed address.
pub struct FakeDma {
    pub address: usize,
    pub interrupts_cleared: u32,
}

impl FakeDma {
    /// A channel currently working inside `half` of `ring`.
    pub fn in_half(ring: &RingBuffer, half: DmaHalf) -> Self {
        FakeDma {
            address: ring.half_address(half),
            interrupts_cleared: 0,
        }
    }

    pub fn move_to(&mut self, ring: &RingBuffer, half: DmaHalf) {
        self.address = ring.half_address(half);
    }
}

impl DmaChannel for FakeDma {
    fn current_address(&self) -> usize {
        self.address
    }

    fn clear_interrupt(&mut self) {
        self.interrupts_cleared += 1;
    }
}

/// Records every cache operation.
#[derive(Default)]
pub struct RecordingCache {
    pub invalidations: u32,
    pub flushes: u32,
    pub last_region: Option<(usize, usize)>,
}

impl CacheMaintenance for RecordingCache {
    fn invalidate(&mut self, region: &[u32]) {
        self.invalidations += 1;
        self.last_region = Some((region.as_ptr() as usize, region.len()));
    }

    fn flush_invalidate(&mut self, region: &[u32]) {
        self.flushes += 1;
        self.last_region = Some((region.as_ptr() as usize, region.len()));
    }
}

/// Graph that copies captured pairs and serves queued playback blocks.
pub struct TestGraph<'p> {
    pub captured: u32,
    pub last_left: [i16; AUDIO_BLOCK_SAMPLES],
    pub last_right: [i16; AUDIO_BLOCK_SAMPLES],
    pub pending: [Option<AudioBlock<'p>>; 2],
    pub requests: u32,
}

impl<'p> TestGraph<'p> {
    pub fn new() -> Self {
        TestGraph {
            captured: 0,
            last_left: [0; AUDIO_BLOCK_SAMPLES],
            last_right: [0; AUDIO_BLOCK_SAMPLES],
            pending: [None, None],
            requests: 0,
        }
    }

    /// Offer `block` on `channel` at the next output exchange.
    pub fn offer(&mut self, channel: Channel, block: AudioBlock<'p>) {
        self.pending[channel.index()] = Some(block);
    }
}

impl<'p> AudioGraph<'p> for TestGraph<'p> {
    fn capture_did_arrive(&mut self, left: AudioBlock<'p>, right: AudioBlock<'p>) {
        self.captured += 1;
        self.last_left = *left;
        self.last_right = *right;
    }

    fn playback_wants_data(&mut self, channel: Channel) -> Option<AudioBlock<'p>> {
        self.requests += 1;
        self.pending[channel.index()].take()
    }
}

/// Allocate a block filled with `value`.
pub fn filled(pool: &BlockPool, value: i16) -> AudioBlock<'_> {
    let mut block = pool.allocate().unwrap();
    block.fill(value);
    block
}

/// Allocate a block holding `start, start + step, ...`.
pub fn ramp(pool: &BlockPool, start: i16, step: i16) -> AudioBlock<'_> {
    let mut block = pool.allocate().unwrap();
    for (i, sample) in block.iter_mut().enumerate() {
        *sample = start.wrapping_add((i as i16).wrapping_mul(step));
    }
    block
}

/// Hold every free block of `pool` except `keep`.
pub fn exhaust(pool: &BlockPool, keep: u32) -> [Option<AudioBlock<'_>>; POOL_SIZE] {
    let to_take = pool.free_count().saturating_sub(keep);
    core::array::from_fn(|i| if (i as u32) < to_take { pool.allocate() } else { None })
}
