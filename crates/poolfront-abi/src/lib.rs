//! C ABI for the poolfront allocator.
//!
//! Entry points for callers ported from C — notably the numeric
//! vector/matrix routines that take their scratch buffers from this
//! allocator. The surface keeps the traditional contract: allocation
//! never reports failure to the caller; exhaustion that survives the
//! drain-and-retry sequence terminates the process.
//!
//! Unlike `malloc`, these functions are not drop-in replacements for
//! the system allocator: pointers from `pf_malloc` must go back to
//! `pf_free`/`pf_realloc`, on the thread that allocated them.

use std::ffi::c_void;

use poolfront_heap as heap;

/// Allocates `size` bytes of uninitialized memory.
///
/// Never returns null: a zero `size` yields a valid zero-capacity
/// pointer, and unrecoverable exhaustion aborts the process.
///
/// # Safety
///
/// Caller must eventually pass the returned pointer to [`pf_free`] or
/// [`pf_realloc`] exactly once, on this thread.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn pf_malloc(size: usize) -> *mut c_void {
    heap::allocate(size).as_ptr().cast()
}

/// Resizes an allocation to `size` bytes, preserving contents up to
/// the smaller capacity.
///
/// A null `ptr` behaves as [`pf_malloc`]; `size == 0` frees `ptr` and
/// returns null. Unrecoverable exhaustion aborts the process.
///
/// # Safety
///
/// `ptr` must be null or a live pointer from [`pf_malloc`] /
/// [`pf_realloc`], owned by the calling thread; it is invalidated by
/// this call.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn pf_realloc(ptr: *mut c_void, size: usize) -> *mut c_void {
    // SAFETY: forwarded caller contract.
    unsafe { heap::reallocate(ptr.cast(), size) }.cast()
}

/// Releases an allocation. If `ptr` is null, no operation is performed.
///
/// Small blocks are cached on the calling thread's free-lists for
/// reuse; they return to the system allocator on cache-bound pressure,
/// [`pf_collect`], or thread exit.
///
/// # Safety
///
/// `ptr` must be null or a live pointer from [`pf_malloc`] /
/// [`pf_realloc`], freed at most once, on the thread that allocated
/// it.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn pf_free(ptr: *mut c_void) {
    // SAFETY: forwarded caller contract.
    unsafe { heap::free(ptr.cast()) };
}

/// Usable payload capacity of an allocation.
///
/// Returns 0 for null and for blocks above the pooled range (their
/// sizes are not tracked).
///
/// # Safety
///
/// `ptr` must be null or a live pointer from this allocator.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn pf_msize(ptr: *const c_void) -> usize {
    // SAFETY: forwarded caller contract.
    unsafe { heap::usable_size(ptr.cast()) }
}

/// Bytes currently cached in the calling thread's free-lists.
#[unsafe(no_mangle)]
pub extern "C" fn pf_cached() -> usize {
    heap::cached_bytes()
}

/// Releases every block cached by the calling thread back to the
/// system allocator and returns the number of bytes released.
#[unsafe(no_mangle)]
pub extern "C" fn pf_collect() -> usize {
    heap::collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use poolfront_core::size_class::{STEP, block_size, class_of};

    #[test]
    fn malloc_free_roundtrip() {
        unsafe {
            let ptr = pf_malloc(128);
            assert!(!ptr.is_null());
            // Exercise the pointer the way a C caller would.
            libc::memset(ptr, 0x42, 128);
            assert!(pf_msize(ptr) >= 128);
            pf_free(ptr);
        }
        pf_collect();
    }

    #[test]
    fn free_null_is_noop() {
        unsafe { pf_free(std::ptr::null_mut()) };
    }

    #[test]
    fn msize_null_is_zero() {
        assert_eq!(unsafe { pf_msize(std::ptr::null()) }, 0);
    }

    #[test]
    fn realloc_grows_preserving_bytes() {
        unsafe {
            let ptr = pf_malloc(8);
            libc::memset(ptr, 0x17, 8);
            let grown = pf_realloc(ptr, 4096);
            assert!(!grown.is_null());
            for i in 0..8 {
                assert_eq!(grown.cast::<u8>().add(i).read(), 0x17);
            }
            let gone = pf_realloc(grown, 0);
            assert!(gone.is_null());
        }
        pf_collect();
    }

    #[test]
    fn cached_and_collect_account_for_frees() {
        pf_collect();
        unsafe {
            let ptr = pf_malloc(STEP);
            assert_eq!(pf_cached(), 0);
            pf_free(ptr);
        }
        assert_eq!(pf_cached(), block_size(class_of(STEP)));
        assert_eq!(pf_collect(), block_size(class_of(STEP)));
        assert_eq!(pf_cached(), 0);
    }

    #[test]
    fn zero_size_malloc_is_non_null() {
        unsafe {
            let ptr = pf_malloc(0);
            assert!(!ptr.is_null());
            assert_eq!(pf_msize(ptr), 0);
            pf_free(ptr);
        }
    }
}
