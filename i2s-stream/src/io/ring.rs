//! DMA ring buffer shared with the SAI peripheral.
//!
//! ```text
//!            ┌──────────── RING_BUFFER_FRAMES × u32 ────────────┐
//!            │      First half       │      Second half          │
//!            │  HALF_BLOCK_SAMPLES   │   HALF_BLOCK_SAMPLES      │
//!            └───────────────────────┴───────────────────────────┘
//!  DMA in First  → software owns Second
//!  DMA in Second → software owns First
//! ```
//!
//! Each `u32` is one packed stereo frame (see [`interleave`](super::interleave)).
//! One full trip around the ring is one processing period, so each half
//! carries half a block per channel.

use core::mem::size_of;

use crate::constants::{HALF_BLOCK_SAMPLES, RING_BUFFER_FRAMES};

/// Which half of a DMA ring buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DmaHalf {
    /// Frames `0..HALF_BLOCK_SAMPLES`.
    First,
    /// Frames `HALF_BLOCK_SAMPLES..RING_BUFFER_FRAMES`.
    Second,
}

impl DmaHalf {
    /// The opposite half.
    pub const fn other(self) -> Self {
        match self {
            DmaHalf::First => DmaHalf::Second,
            DmaHalf::Second => DmaHalf::First,
        }
    }

    const fn range(self) -> core::ops::Range<usize> {
        match self {
            DmaHalf::First => 0..HALF_BLOCK_SAMPLES,
            DmaHalf::Second => HALF_BLOCK_SAMPLES..RING_BUFFER_FRAMES,
        }
    }
}

/// Cache-line aligned stereo ring buffer.
///
/// Place in DMA-reachable memory, e.g.
/// `#[link_section = ".dmabuffers"] static mut RX_RING: RingBuffer = RingBuffer::new();`
#[repr(C, align(32))]
pub struct RingBuffer {
    frames: [u32; RING_BUFFER_FRAMES],
}

const _: () = assert!((HALF_BLOCK_SAMPLES * size_of::<u32>()) % 32 == 0);

impl RingBuffer {
    pub const fn new() -> Self {
        RingBuffer {
            frames: [0; RING_BUFFER_FRAMES],
        }
    }

    /// Base address, for programming the DMA channel.
    pub fn base_address(&self) -> usize {
        self.frames.as_ptr() as usize
    }

    /// First address of `half`.
    pub fn half_address(&self, half: DmaHalf) -> usize {
        self.base_address() + half.range().start * size_of::<u32>()
    }

    /// Size of the whole ring in bytes.
    pub const fn size_bytes(&self) -> usize {
        RING_BUFFER_FRAMES * size_of::<u32>()
    }

    /// The half the DMA engine is working in, given its current address.
    pub fn active_half(&self, dma_address: usize) -> DmaHalf {
        if dma_address < self.base_address() + self.size_bytes() / 2 {
            DmaHalf::First
        } else {
            DmaHalf::Second
        }
    }

    pub fn half(&self, half: DmaHalf) -> &[u32] {
        &self.frames[half.range()]
    }

    pub fn half_mut(&mut self, half: DmaHalf) -> &mut [u32] {
        &mut self.frames[half.range()]
    }

    pub fn frames(&self) -> &[u32; RING_BUFFER_FRAMES] {
        &self.frames
    }

    pub fn frames_mut(&mut self) -> &mut [u32; RING_BUFFER_FRAMES] {
        &mut self.frames
    }
}

impl Default for RingBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ring_is_cache_line_aligned() {
        let ring = RingBuffer::new();
        assert_eq!(ring.base_address() % 32, 0);
        assert_eq!(ring.half_address(DmaHalf::Second) % 32, 0);
    }

    #[test]
    fn active_half_from_address() {
        let ring = RingBuffer::new();
        let base = ring.base_address();
        assert_eq!(ring.active_half(base), DmaHalf::First);
        let half_bytes = ring.size_bytes() / 2;
        assert_eq!(ring.active_half(base + half_bytes - 2), DmaHalf::First);
        assert_eq!(ring.active_half(base + half_bytes), DmaHalf::Second);
        assert_eq!(ring.active_half(base + 2 * half_bytes - 2), DmaHalf::Second);
    }

    #[test]
    fn halves_partition_the_ring() {
        let mut ring = RingBuffer::new();
        ring.half_mut(DmaHalf::First).fill(1);
        ring.half_mut(DmaHalf::Second).fill(2);
        assert_eq!(ring.half(DmaHalf::First).len(), HALF_BLOCK_SAMPLES);
        assert_eq!(ring.frames()[HALF_BLOCK_SAMPLES - 1], 1);
        assert_eq!(ring.frames()[HALF_BLOCK_SAMPLES], 2);
    }

    #[test]
    fn other_half() {
        assert_eq!(DmaHalf::First.other(), DmaHalf::Second);
        assert_eq!(DmaHalf::Second.other(), DmaHalf::First);
    }
}
