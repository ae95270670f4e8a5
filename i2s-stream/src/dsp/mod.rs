//! Sample-level processing applied to captured blocks.

pub mod dc_offset;

pub use dc_offset::{CalibrationState, DcOffsetCalibrator};

/// Saturate an `i32` to `i16` range (`-32768..=32767`).
///
/// Maps to ARM `SSAT #16` on Cortex-M4/M7.
#[inline(always)]
pub fn saturate16(val: i32) -> i16 {
    #[cfg(all(target_arch = "arm", target_feature = "dsp"))]
    {
        let out: i32;
        unsafe {
            core::arch::asm!(
                "ssat {out}, #16, {val}",
                out = out(reg) out,
                val = in(reg) val,
            );
        }
        out as i16
    }
    #[cfg(not(all(target_arch = "arm", target_feature = "dsp")))]
    {
        val.clamp(i16::MIN as i32, i16::MAX as i32) as i16
    }
}
