//! Hardware boundary: DMA channel position and d-cache maintenance.
//!
//! The handoffs never talk to registers directly. A board crate implements
//! [`DmaChannel`] over its eDMA channel and picks a [`CacheMaintenance`]
//! implementation matching where the ring buffers live:
//!
//! | Ring buffer placement | Implementation |
//! |-----------------------|----------------|
//! | Cacheable RAM (DMAMEM / OCRAM) on Cortex-M7 | [`ScbCacheMaintenance`] (`cortex-m` feature) |
//! | Non-cacheable or tightly-coupled RAM | [`NoCacheMaintenance`] |

/// The subset of a DMA channel the interrupt handlers need.
pub trait DmaChannel {
    /// Address the engine will access next.
    ///
    /// For a receive channel this is the destination address (DADDR), for a
    /// transmit channel the source address (SADDR).
    fn current_address(&self) -> usize;

    /// Acknowledge the half/major-loop interrupt.
    fn clear_interrupt(&mut self);
}

/// Cache operations pairing every CPU access to DMA memory.
pub trait CacheMaintenance {
    /// Discard cached lines covering `region` before reading DMA-written data.
    fn invalidate(&mut self, region: &[u32]);

    /// Write back and discard cached lines covering `region` after the CPU
    /// filled it for DMA to read.
    fn flush_invalidate(&mut self, region: &[u32]);
}

/// For coherent memory: every operation is a no-op.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCacheMaintenance;

impl CacheMaintenance for NoCacheMaintenance {
    #[inline(always)]
    fn invalidate(&mut self, _region: &[u32]) {}

    #[inline(always)]
    fn flush_invalidate(&mut self, _region: &[u32]) {}
}

/// Cortex-M7 data cache maintenance through the SCB.
///
/// Ring buffers must be 32-byte aligned and a multiple of 32 bytes per half
/// so that maintenance never touches neighbouring data;
/// [`RingBuffer`](crate::io::RingBuffer) satisfies both.
#[cfg(feature = "cortex-m")]
pub struct ScbCacheMaintenance {
    scb: cortex_m::peripheral::SCB,
}

#[cfg(feature = "cortex-m")]
impl ScbCacheMaintenance {
    pub fn new(scb: cortex_m::peripheral::SCB) -> Self {
        Self { scb }
    }

    pub fn free(self) -> cortex_m::peripheral::SCB {
        self.scb
    }
}

#[cfg(feature = "cortex-m")]
impl CacheMaintenance for ScbCacheMaintenance {
    fn invalidate(&mut self, region: &[u32]) {
        // SAFETY: the region is a settled receive half. The CPU never writes
        // receive buffers, so no dirty lines are discarded.
        unsafe {
            self.scb.invalidate_dcache_by_address(
                region.as_ptr() as usize,
                core::mem::size_of_val(region),
            );
        }
    }

    fn flush_invalidate(&mut self, region: &[u32]) {
        self.scb.clean_invalidate_dcache_by_address(
            region.as_ptr() as usize,
            core::mem::size_of_val(region),
        );
    }
}
