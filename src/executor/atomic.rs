//! Atomic views over plain integer buffers.
//!
//! Column buffers are stored as plain `Vec<u32>` / `Vec<i32>` so they can be
//! read without atomics once a phase is over. During a phase that needs
//! concurrent writes, an exclusive borrow is reinterpreted as a slice of
//! atomics for the duration of that phase.

use std::sync::atomic::{AtomicI32, AtomicU32};

const _: () = assert!(std::mem::align_of::<AtomicU32>() == std::mem::align_of::<u32>());
const _: () = assert!(std::mem::align_of::<AtomicI32>() == std::mem::align_of::<i32>());

/// View an exclusively borrowed `u32` slice as atomics.
#[inline]
pub(crate) fn as_atomic_u32(data: &mut [u32]) -> &[AtomicU32] {
    // SAFETY: `AtomicU32` has the same size and bit validity as `u32`, and the
    // alignment is asserted equal above. The exclusive borrow guarantees no
    // non-atomic access overlaps the returned view.
    unsafe { &*(data as *mut [u32] as *const [AtomicU32]) }
}

/// View an exclusively borrowed `i32` slice as atomics.
#[inline]
pub(crate) fn as_atomic_i32(data: &mut [i32]) -> &[AtomicI32] {
    // SAFETY: as in `as_atomic_u32`.
    unsafe { &*(data as *mut [i32] as *const [AtomicI32]) }
}
