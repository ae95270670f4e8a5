//! Interrupt-masked shared state.
//!
//! State touched by both a DMA interrupt and the foreground pass lives in an
//! [`IrqCell`]. Every access runs inside a `critical_section::with` closure,
//! so the mask is restored on every exit path, early returns included.
//!
//! Keep closures to pointer and offset swaps. Allocation, DC math and block
//! hand-off happen after the closure returns.

use core::cell::RefCell;

use critical_section::Mutex;

/// Interior mutability guarded by a scoped interrupt mask.
pub struct IrqCell<T> {
    inner: Mutex<RefCell<T>>,
}

impl<T> IrqCell<T> {
    pub const fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(value)),
        }
    }

    /// Run `f` with exclusive access and interrupts masked.
    #[inline]
    pub fn with<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&mut T) -> R,
    {
        critical_section::with(|cs| {
            let mut value = self.inner.borrow_ref_mut(cs);
            f(&mut value)
        })
    }

    /// Run `f` with shared access and interrupts masked.
    #[inline]
    pub fn with_ref<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        critical_section::with(|cs| {
            let value = self.inner.borrow_ref(cs);
            f(&value)
        })
    }
}
