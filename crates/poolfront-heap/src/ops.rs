//! Allocation operations.
//!
//! Every call follows the same shape: map the request to a size class,
//! consult the calling thread's pool, fall back to the system allocator
//! with layered recovery. Recovery is two-stage: a first failure drains
//! the pool (handing every cached byte back to the system) and retries
//! exactly once; a second failure is surfaced as [`AllocError`] from
//! the `try_*` entry points, or aborts the process from the infallible
//! ones — at this layer there is nobody below the application to
//! report to.

use std::alloc::Layout;
use std::ptr::NonNull;

use poolfront_core::error::AllocError;
use poolfront_core::metrics::{HeapMetrics, global_metrics};
use poolfront_core::size_class::{
    HEADER_SIZE, block_size, checked_block_size, class_of, is_pooled, payload_size,
};

use crate::block::{self, Header};
use crate::context::with_pool;
use crate::pool::Pool;

/// Full block size for a request: header-only for zero-byte requests,
/// header plus STEP-rounded payload otherwise.
fn block_total(size: usize, class: usize) -> Result<usize, AllocError> {
    if size == 0 {
        return Ok(HEADER_SIZE);
    }
    checked_block_size(class).ok_or(AllocError::CapacityOverflow { size })
}

fn system_alloc(layout: Layout) -> *mut u8 {
    HeapMetrics::inc(&global_metrics().system_calls);
    // SAFETY: block layouts are at least HEADER_SIZE bytes.
    unsafe { std::alloc::alloc(layout) }
}

fn oom_abort(err: AllocError) -> ! {
    eprintln!("poolfront: fatal: {err}");
    std::process::abort()
}

/// Allocates `size` bytes, reusing a cached block of the matching size
/// class when one exists.
///
/// Never returns null; a zero-byte request yields a valid pointer to a
/// zero-capacity payload. Fails only on system-allocator exhaustion
/// that survives a drain-and-retry, or on a request too large to size
/// as a block.
pub fn try_allocate(size: usize) -> Result<NonNull<u8>, AllocError> {
    let class = class_of(size);
    let metrics = global_metrics();
    with_pool(|pool| {
        if is_pooled(class) {
            if let Some(blk) = pool.take(class) {
                HeapMetrics::inc(&metrics.pool_hits);
                // SAFETY: the pool owned `blk` and it is a block of `class`.
                return Ok(unsafe { block::stamp(blk, class, block_size(class)) });
            }
            HeapMetrics::inc(&metrics.pool_misses);
        } else {
            HeapMetrics::inc(&metrics.unpooled_allocs);
        }

        // Shed cache pressure before growing further.
        #[cfg(feature = "bounded-cache")]
        if pool.over_limit() {
            HeapMetrics::inc(&metrics.bound_drains);
            pool.drain();
        }

        let total = block_total(size, class)?;
        let layout = block::layout_for(total).ok_or(AllocError::CapacityOverflow { size })?;
        let blk = match NonNull::new(system_alloc(layout).cast::<Header>()) {
            Some(blk) => blk,
            None => {
                let released = pool.drain();
                HeapMetrics::inc(&metrics.oom_retries);
                NonNull::new(system_alloc(layout).cast::<Header>())
                    .ok_or(AllocError::OutOfMemory { size, released })?
            }
        };
        // SAFETY: `blk` is a fresh allocation of `total >= HEADER_SIZE` bytes.
        Ok(unsafe { block::stamp(blk, class, total) })
    })
}

/// Infallible [`try_allocate`]: aborts the process on failure.
#[must_use]
pub fn allocate(size: usize) -> NonNull<u8> {
    try_allocate(size).unwrap_or_else(|err| oom_abort(err))
}

/// Resizes a block to `new_size` bytes, preserving its contents up to
/// the smaller of the two payload capacities.
///
/// A null `ptr` behaves as [`try_allocate`]; `new_size == 0` frees the
/// block and returns null. A live block is always resized through the
/// system allocator — never satisfied from the free-lists, even when a
/// cached block of the exact target class exists.
///
/// # Safety
///
/// `ptr` must be null or a payload pointer from this allocator's
/// allocate/reallocate, not freed since, and owned by the calling
/// thread.
pub unsafe fn try_reallocate(ptr: *mut u8, new_size: usize) -> Result<*mut u8, AllocError> {
    let Some(payload) = NonNull::new(ptr) else {
        return try_allocate(new_size).map(NonNull::as_ptr);
    };
    if new_size == 0 {
        // SAFETY: forwarded caller contract.
        unsafe { free(ptr) };
        return Ok(std::ptr::null_mut());
    }

    let class = class_of(new_size);
    // SAFETY: `payload` came from this allocator per the caller.
    let blk = unsafe { block::header_of(payload) };
    let old_total = unsafe { blk.as_ref().total };
    let metrics = global_metrics();

    with_pool(|pool| {
        #[cfg(feature = "bounded-cache")]
        if pool.over_limit() {
            HeapMetrics::inc(&metrics.bound_drains);
            pool.drain();
        }

        let new_total = block_total(new_size, class)?;
        // Sizing rules are identical to allocate: a total the system
        // allocator cannot express as a layout is rejected up front,
        // not handed to the resize primitive.
        block::layout_for(new_total).ok_or(AllocError::CapacityOverflow { size: new_size })?;
        let old_layout = block::layout_for(old_total).expect("stamped block layout");
        HeapMetrics::inc(&metrics.system_calls);
        // SAFETY: the whole block was allocated with `old_layout`;
        // `new_total` is nonzero.
        let raw =
            unsafe { std::alloc::realloc(blk.as_ptr().cast::<u8>(), old_layout, new_total) };
        let moved = match NonNull::new(raw.cast::<Header>()) {
            Some(moved) => moved,
            None => {
                // The failed resize left the original block intact.
                let released = pool.drain();
                HeapMetrics::inc(&metrics.oom_retries);
                HeapMetrics::inc(&metrics.system_calls);
                // SAFETY: same contract as the first attempt.
                let retry = unsafe {
                    std::alloc::realloc(blk.as_ptr().cast::<u8>(), old_layout, new_total)
                };
                NonNull::new(retry.cast::<Header>()).ok_or(AllocError::OutOfMemory {
                    size: new_size,
                    released,
                })?
            }
        };
        // SAFETY: `moved` is a valid block of `new_total` bytes.
        Ok(unsafe { block::stamp(moved, class, new_total) }.as_ptr())
    })
}

/// Infallible [`try_reallocate`]: aborts the process on failure.
///
/// # Safety
///
/// Same contract as [`try_reallocate`].
pub unsafe fn reallocate(ptr: *mut u8, new_size: usize) -> *mut u8 {
    // SAFETY: forwarded caller contract.
    unsafe { try_reallocate(ptr, new_size) }.unwrap_or_else(|err| oom_abort(err))
}

/// Frees a block: pooled classes go onto the calling thread's
/// free-list, everything else straight back to the system allocator.
/// Null is a no-op. Double-free and foreign pointers are undefined
/// behavior, not detected.
///
/// # Safety
///
/// `ptr` must be null or a payload pointer from this allocator's
/// allocate/reallocate, not freed since, and freed on the thread that
/// allocated it.
pub unsafe fn free(ptr: *mut u8) {
    let Some(payload) = NonNull::new(ptr) else {
        return;
    };
    // SAFETY: `payload` came from this allocator per the caller.
    let blk = unsafe { block::header_of(payload) };
    let header = unsafe { *blk.as_ptr() };
    if is_pooled(header.class) {
        with_pool(|pool| {
            // SAFETY: the caller relinquishes the payload here.
            unsafe { pool.give(blk, header.class) };
            // The bound is checked after every insertion, not just on
            // the allocate path.
            #[cfg(feature = "bounded-cache")]
            if pool.over_limit() {
                HeapMetrics::inc(&global_metrics().bound_drains);
                pool.drain();
            }
        });
    } else {
        let layout = block::layout_for(header.total).expect("stamped block layout");
        HeapMetrics::inc(&global_metrics().system_calls);
        // SAFETY: the block was allocated with exactly this layout.
        unsafe { std::alloc::dealloc(blk.as_ptr().cast::<u8>(), layout) };
    }
}

/// Payload capacity of a live allocation: `0` for null and for
/// unpooled blocks (their true size is not tracked — a deliberate
/// limitation, mirrored from the original).
///
/// # Safety
///
/// `ptr` must be null or a live payload pointer from this allocator.
#[must_use]
pub unsafe fn usable_size(ptr: *const u8) -> usize {
    let Some(payload) = NonNull::new(ptr.cast_mut()) else {
        return 0;
    };
    // SAFETY: `payload` came from this allocator per the caller.
    let class = unsafe { block::header_of(payload).as_ref().class };
    if is_pooled(class) { payload_size(class) } else { 0 }
}

/// Bytes cached in the calling thread's free-lists.
#[must_use]
pub fn cached_bytes() -> usize {
    with_pool(|pool| pool.cached_bytes())
}

/// Releases every block cached by the calling thread back to the
/// system allocator. Returns the bytes released.
pub fn collect() -> usize {
    HeapMetrics::inc(&global_metrics().explicit_drains);
    with_pool(Pool::drain)
}
