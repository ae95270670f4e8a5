//! Conversion between packed stereo frames and per-channel sample runs.
//!
//! Each `u32` in a ring buffer holds one stereo frame:
//! - bits 0–15: left sample (`i16`)
//! - bits 16–31: right sample (`i16`)
//!
//! On little-endian Cortex-M this is `[left, right]` as consecutive `i16`
//! values, the layout the SAI emits with 16-bit DMA transfers.

use crate::graph::Channel;

/// Pack one stereo frame.
#[inline(always)]
pub const fn pack(left: i16, right: i16) -> u32 {
    (left as u16 as u32) | ((right as u16 as u32) << 16)
}

/// Unpack one stereo frame into `(left, right)`.
#[inline(always)]
pub const fn unpack(frame: u32) -> (i16, i16) {
    (frame as i16, (frame >> 16) as i16)
}

/// Pack matching runs of left and right samples into `dest`.
///
/// # Panics
///
/// Debug-asserts that all slices have the same length.
pub fn interleave_lr(dest: &mut [u32], left: &[i16], right: &[i16]) {
    debug_assert_eq!(dest.len(), left.len());
    debug_assert_eq!(dest.len(), right.len());

    for ((frame, &l), &r) in dest.iter_mut().zip(left).zip(right) {
        *frame = pack(l, r);
    }
}

/// Pack one channel into `dest`, writing zero for the other channel.
///
/// # Panics
///
/// Debug-asserts that both slices have the same length.
pub fn interleave_mono(dest: &mut [u32], samples: &[i16], channel: Channel) {
    debug_assert_eq!(dest.len(), samples.len());

    match channel {
        Channel::Left => {
            for (frame, &s) in dest.iter_mut().zip(samples) {
                *frame = pack(s, 0);
            }
        }
        Channel::Right => {
            for (frame, &s) in dest.iter_mut().zip(samples) {
                *frame = pack(0, s);
            }
        }
    }
}

/// Split packed frames into separate left and right runs.
///
/// # Panics
///
/// Debug-asserts that all slices have the same length.
pub fn deinterleave(src: &[u32], left: &mut [i16], right: &mut [i16]) {
    debug_assert_eq!(src.len(), left.len());
    debug_assert_eq!(src.len(), right.len());

    for ((&frame, l), r) in src.iter().zip(left.iter_mut()).zip(right.iter_mut()) {
        (*l, *r) = unpack(frame);
    }
}

/// Zero both channels of every frame in `dest`.
pub fn silence(dest: &mut [u32]) {
    dest.fill(0);
}
