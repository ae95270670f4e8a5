use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicU32, Ordering};

use crate::constants::{AUDIO_BLOCK_SAMPLES, POOL_SIZE};

use super::handle::AudioBlock;

/// Raw audio block storage: 128 signed 16-bit samples, 4-byte aligned.
#[repr(C, align(4))]
pub(crate) struct AudioBlockData {
    pub(crate) samples: [i16; AUDIO_BLOCK_SAMPLES],
}

impl AudioBlockData {
    const fn zeroed() -> Self {
        AudioBlockData {
            samples: [0i16; AUDIO_BLOCK_SAMPLES],
        }
    }
}

/// Snapshot of pool activity counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PoolStats {
    /// Successful allocations.
    pub allocations: u32,
    /// Blocks returned to the pool.
    pub releases: u32,
    /// Allocation attempts that found the pool exhausted.
    pub failures: u32,
}

/// Fixed arena of audio blocks with a lock-free free-set.
///
/// Bit N of the bitmap is set while slot N is owned by an [`AudioBlock`].
/// Ownership is exclusive, so there is no reference count: a slot goes back
/// to the free-set exactly once, when its handle is dropped. All operations
/// are lock-free and ISR-safe, which lets the playback interrupt retire a
/// drained block without masking interrupts.
///
/// ```ignore
/// static POOL: BlockPool = BlockPool::new();
///
/// let mut block = POOL.allocate().unwrap();
/// block[0] = 1234;
/// drop(block); // slot returns to the pool
/// ```
pub struct BlockPool {
    bitmap: AtomicU32,
    allocations: AtomicU32,
    releases: AtomicU32,
    failures: AtomicU32,
    storage: UnsafeCell<[AudioBlockData; POOL_SIZE]>,
}

// SAFETY: The bitmap CAS hands each slot to exactly one handle; storage for a
// slot is only reached through that handle until it is freed.
unsafe impl Sync for BlockPool {}

impl BlockPool {
    /// Create a new pool. All slots start free.
    pub const fn new() -> Self {
        const ZEROED: AudioBlockData = AudioBlockData::zeroed();
        BlockPool {
            bitmap: AtomicU32::new(0),
            allocations: AtomicU32::new(0),
            releases: AtomicU32::new(0),
            failures: AtomicU32::new(0),
            storage: UnsafeCell::new([ZEROED; POOL_SIZE]),
        }
    }

    /// Take a zeroed block from the pool, or `None` if every slot is in use.
    ///
    /// Never blocks; callers skip work for the period on `None`.
    pub fn allocate(&self) -> Option<AudioBlock<'_>> {
        match self.claim_slot() {
            Some(slot) => {
                self.allocations.fetch_add(1, Ordering::Relaxed);
                // SAFETY: the slot was just claimed by the CAS in `claim_slot`.
                unsafe { (*self.data_ptr(slot)).samples.fill(0) };
                Some(AudioBlock::new(self, slot))
            }
            None => {
                self.failures.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Return a block to its pool. `None` is accepted and ignored.
    pub fn release(&self, block: Option<AudioBlock<'_>>) {
        drop(block);
    }

    fn claim_slot(&self) -> Option<u8> {
        let mut bitmap = self.bitmap.load(Ordering::Acquire);
        loop {
            let slot = (!bitmap).trailing_zeros();
            if slot as usize >= POOL_SIZE {
                return None;
            }
            let bit = 1u32 << slot;
            match self.bitmap.compare_exchange_weak(
                bitmap,
                bitmap | bit,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return Some(slot as u8),
                Err(current) => bitmap = current,
            }
        }
    }

    /// Clear the slot's bit. Called from `AudioBlock::drop` only.
    pub(crate) fn free_slot(&self, slot: u8) {
        debug_assert!((slot as usize) < POOL_SIZE);
        let bit = 1u32 << slot;
        let old = self.bitmap.fetch_and(!bit, Ordering::Release);
        debug_assert!(old & bit != 0, "slot {} freed twice", slot);
        self.releases.fetch_add(1, Ordering::Relaxed);
    }

    /// # Safety
    /// Caller must own `slot` through an [`AudioBlock`].
    pub(crate) unsafe fn data_ptr(&self, slot: u8) -> *mut AudioBlockData {
        unsafe {
            self.storage
                .get()
                .cast::<AudioBlockData>()
                .add(slot as usize)
        }
    }

    /// Number of blocks currently owned by handles.
    pub fn allocated_count(&self) -> u32 {
        self.bitmap.load(Ordering::Acquire).count_ones()
    }

    /// Number of blocks available for allocation.
    pub fn free_count(&self) -> u32 {
        POOL_SIZE as u32 - self.allocated_count()
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            allocations: self.allocations.load(Ordering::Relaxed),
            releases: self.releases.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}

impl Default for BlockPool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_returns_zeroed_block() {
        let pool = BlockPool::new();
        let mut block = pool.allocate().unwrap();
        assert!(block.iter().all(|&s| s == 0));
        block.fill(-7);
        let slot = block.slot();
        drop(block);

        // The same slot comes back zeroed.
        let again = pool.allocate().unwrap();
        assert_eq!(again.slot(), slot);
        assert!(again.iter().all(|&s| s == 0));
    }

    #[test]
    fn allocate_unique_slots() {
        let pool = BlockPool::new();
        let blocks: [AudioBlock<'_>; POOL_SIZE] =
            core::array::from_fn(|_| pool.allocate().unwrap());
        let mut slots: [u8; POOL_SIZE] = core::array::from_fn(|i| blocks[i].slot());
        slots.sort();
        for pair in slots.windows(2) {
            assert_ne!(pair[0], pair[1]);
        }
        assert_eq!(pool.allocated_count(), POOL_SIZE as u32);
        assert_eq!(pool.free_count(), 0);
    }

    #[test]
    fn exhaustion_returns_none_and_counts_failure() {
        let pool = BlockPool::new();
        let _blocks: [AudioBlock<'_>; POOL_SIZE] =
            core::array::from_fn(|_| pool.allocate().unwrap());
        assert!(pool.allocate().is_none());
        assert!(pool.allocate().is_none());
        assert_eq!(pool.stats().failures, 2);
        assert_eq!(pool.stats().allocations, POOL_SIZE as u32);
    }

    #[test]
    fn drop_frees_slot() {
        let pool = BlockPool::new();
        let block = pool.allocate().unwrap();
        assert_eq!(pool.allocated_count(), 1);
        drop(block);
        assert_eq!(pool.allocated_count(), 0);
        assert_eq!(pool.stats().releases, 1);
    }

    #[test]
    fn release_none_is_a_no_op() {
        let pool = BlockPool::new();
        pool.release(None);
        assert_eq!(pool.stats(), PoolStats::default());

        let block = pool.allocate();
        pool.release(block);
        assert_eq!(pool.allocated_count(), 0);
        assert_eq!(pool.stats().releases, 1);
    }

    #[test]
    fn pools_are_independent() {
        let a = BlockPool::new();
        let b = BlockPool::new();
        let _held = a.allocate().unwrap();
        assert_eq!(a.allocated_count(), 1);
        assert_eq!(b.allocated_count(), 0);
    }
}
