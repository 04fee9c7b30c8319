//! Per-thread pool of size-class free-lists.
//!
//! One free-list head per class, LIFO: the most recently freed block is
//! reused first, which keeps its cache lines warm. With the
//! `bounded-cache` feature the pool tracks its cached bytes
//! incrementally and exposes the bound check; without it, the total is
//! computed by an O(classes + blocks) traversal on demand and nothing
//! ever drains automatically. Both modes report identical totals for
//! the same sequence of operations.

use std::ptr::NonNull;

use poolfront_core::metrics::{HeapMetrics, global_metrics};
use poolfront_core::size_class::{NUM_CLASSES, block_size};

use crate::block::{self, Header};

/// Free-lists for one execution context. Not `Send`: blocks must be
/// freed on the thread that allocated them.
pub struct Pool {
    /// One intrusive free-list head per size class.
    heads: [Option<NonNull<Header>>; NUM_CLASSES],
    /// Bytes held across all free-lists, headers included.
    #[cfg(feature = "bounded-cache")]
    cached: usize,
    /// Drain threshold in bytes.
    limit: usize,
}

impl Pool {
    /// Creates an empty pool with the configured cache bound.
    #[must_use]
    pub fn new() -> Self {
        Self::with_limit(poolfront_core::config::cache_limit())
    }

    /// Creates an empty pool with an explicit cache bound (bytes).
    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        Self {
            heads: [None; NUM_CLASSES],
            #[cfg(feature = "bounded-cache")]
            cached: 0,
            limit,
        }
    }

    /// The drain threshold in bytes.
    #[must_use]
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Pops the most recently freed block of `class`, if any.
    ///
    /// The block's free-list link word is already cleared when it is
    /// handed back.
    pub fn take(&mut self, class: usize) -> Option<NonNull<Header>> {
        debug_assert!(class < NUM_CLASSES);
        let head = self.heads[class]?;
        // SAFETY: list members were linked by `give`, so the head holds
        // a valid link word and the pool owns the whole chain.
        let next = unsafe { block::take_free_link(head) };
        self.heads[class] = NonNull::new(next);
        #[cfg(feature = "bounded-cache")]
        {
            self.cached -= block_size(class);
        }
        Some(head)
    }

    /// Pushes a block onto the free-list for `class` (LIFO).
    ///
    /// # Safety
    ///
    /// `block` must be a stamped block of exactly `class`, exclusively
    /// owned by the allocator (its previous owner has relinquished the
    /// payload), and `class` must be below `NUM_CLASSES`.
    pub unsafe fn give(&mut self, block: NonNull<Header>, class: usize) {
        debug_assert!(class < NUM_CLASSES);
        let next = self.heads[class].map_or(std::ptr::null_mut(), NonNull::as_ptr);
        // SAFETY: the payload is unused from here on; the caller
        // guarantees ownership and the class bound.
        unsafe { block::set_free_link(block, next) };
        self.heads[class] = Some(block);
        #[cfg(feature = "bounded-cache")]
        {
            self.cached += block_size(class);
        }
    }

    /// Total bytes currently cached across all free-lists.
    #[must_use]
    pub fn cached_bytes(&self) -> usize {
        #[cfg(feature = "bounded-cache")]
        {
            debug_assert_eq!(self.cached, self.traverse_cached());
            self.cached
        }
        #[cfg(not(feature = "bounded-cache"))]
        {
            self.traverse_cached()
        }
    }

    /// True when the cached total exceeds the bound.
    #[cfg(feature = "bounded-cache")]
    #[must_use]
    pub fn over_limit(&self) -> bool {
        self.cached > self.limit
    }

    /// Releases every cached block back to the system allocator.
    ///
    /// Returns the number of bytes released. Safe on an empty pool
    /// (returns 0).
    pub fn drain(&mut self) -> usize {
        let mut released = 0usize;
        let mut blocks = 0u64;
        for class in 0..NUM_CLASSES {
            let mut cursor = self.heads[class].take();
            while let Some(blk) = cursor {
                // SAFETY: every list member is a live block of `class`
                // linked by `give`; read its link before freeing it.
                let next = unsafe { block::take_free_link(blk) };
                let layout =
                    block::layout_for(block_size(class)).expect("pooled block layout");
                // SAFETY: the block was obtained from the system
                // allocator with exactly this layout.
                unsafe { std::alloc::dealloc(blk.as_ptr().cast::<u8>(), layout) };
                released += block_size(class);
                blocks += 1;
                cursor = NonNull::new(next);
            }
        }
        #[cfg(feature = "bounded-cache")]
        {
            debug_assert_eq!(released, self.cached);
            self.cached = 0;
        }
        HeapMetrics::add(&global_metrics().blocks_released, blocks);
        released
    }

    fn traverse_cached(&self) -> usize {
        let mut total = 0usize;
        for class in 0..NUM_CLASSES {
            let mut cursor = self.heads[class];
            while let Some(blk) = cursor {
                total += block_size(class);
                // SAFETY: list members hold valid link words.
                cursor = NonNull::new(unsafe { block::free_link(blk) });
            }
        }
        total
    }
}

impl Default for Pool {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Pool {
    // Thread teardown returns cached blocks to the system allocator
    // instead of leaking them.
    fn drop(&mut self) {
        self.drain();
    }
}
