//! Size classes for pooled allocations.
//!
//! Requests are bucketed into `NUM_CLASSES` classes of `STEP`-byte
//! granularity: class `c` serves any request in `(c*STEP, (c+1)*STEP]`.
//! Requests above `MAX_POOLED` bytes fall through to the system
//! allocator and are never cached.

/// Granularity of the size classes (bytes). Must be a power of two.
pub const STEP: usize = 16;

/// Number of pooled size classes.
pub const NUM_CLASSES: usize = 128;

/// Largest pooled payload size (bytes): 2 KiB.
pub const MAX_POOLED: usize = NUM_CLASSES * STEP;

/// Bytes of metadata prefixed to every block. The payload starts at
/// this offset, which also fixes its alignment.
pub const HEADER_SIZE: usize = 16;

/// Alignment of every block and of every returned payload pointer.
/// Sufficient for the widest scalar and any function pointer.
pub const BLOCK_ALIGN: usize = 16;

/// Default bound on bytes cached per thread before a forced drain: 16 MiB.
pub const DEFAULT_CACHE_LIMIT: usize = 1 << 24;

// Sanity checks, mirrored from the original constant table.
const _: () = assert!(STEP.is_power_of_two());
const _: () = assert!(MAX_POOLED.is_power_of_two());
const _: () = assert!(DEFAULT_CACHE_LIMIT.is_power_of_two());
const _: () = assert!(HEADER_SIZE % BLOCK_ALIGN == 0);
const _: () = assert!(HEADER_SIZE >= core::mem::size_of::<usize>() * 2);

/// Computes the size class for a request of `size` bytes.
///
/// Pure and branch-free: `(size - 1) / STEP` in wrapping arithmetic.
/// `size == 0` wraps to a value far above `NUM_CLASSES`, so zero-byte
/// requests are never pooled. Callers must treat any result
/// `>= NUM_CLASSES` as "not pooled".
#[inline]
#[must_use]
pub const fn class_of(size: usize) -> usize {
    size.wrapping_sub(1) / STEP
}

/// Returns true if `class` is within the pooled range.
#[inline]
#[must_use]
pub const fn is_pooled(class: usize) -> bool {
    class < NUM_CLASSES
}

/// Usable payload bytes for a block of the given class.
#[inline]
#[must_use]
pub const fn payload_size(class: usize) -> usize {
    (class + 1) * STEP
}

/// Full block size (header + payload) for the given class.
///
/// Only meaningful for classes derived from a nonzero request size;
/// `class_of(0)` would overflow here and must be filtered out first.
#[inline]
#[must_use]
pub const fn block_size(class: usize) -> usize {
    payload_size(class) + HEADER_SIZE
}

/// Checked variant of [`block_size`] for unpooled classes, where the
/// multiplication can overflow for absurd request sizes.
#[inline]
#[must_use]
pub fn checked_block_size(class: usize) -> Option<usize> {
    class
        .checked_add(1)?
        .checked_mul(STEP)?
        .checked_add(HEADER_SIZE)
}
