use core::fmt;
use core::ops::{Deref, DerefMut};

use crate::constants::AUDIO_BLOCK_SAMPLES;

use super::pool::BlockPool;

/// Owning handle to one pool block.
///
/// Move-only: the block is held by exactly one stage at a time (capture
/// cursor, playback queue, foreground, or graph). Dropping the handle returns
/// the slot to its pool, so a block cannot be used after release or
/// released twice.
pub struct AudioBlock<'p> {
    pool: &'p BlockPool,
    slot: u8,
}

impl<'p> AudioBlock<'p> {
    /// Caller must have just claimed `slot` in `pool`.
    pub(crate) fn new(pool: &'p BlockPool, slot: u8) -> Self {
        AudioBlock { pool, slot }
    }

    /// Pool slot index.
    pub fn slot(&self) -> u8 {
        self.slot
    }
}

impl Deref for AudioBlock<'_> {
    type Target = [i16; AUDIO_BLOCK_SAMPLES];

    fn deref(&self) -> &Self::Target {
        // SAFETY: the handle owns the slot exclusively.
        unsafe { &(*self.pool.data_ptr(self.slot)).samples }
    }
}

impl DerefMut for AudioBlock<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        // SAFETY: the handle owns the slot exclusively.
        unsafe { &mut (*self.pool.data_ptr(self.slot)).samples }
    }
}

impl Drop for AudioBlock<'_> {
    fn drop(&mut self) {
        self.pool.free_slot(self.slot);
    }
}

impl fmt::Debug for AudioBlock<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioBlock")
            .field("slot", &self.slot)
            .finish()
    }
}
