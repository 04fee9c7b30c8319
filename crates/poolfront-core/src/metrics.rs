//! Atomic counters for allocator observability.
//!
//! All counters use relaxed ordering — they are advisory/diagnostic,
//! not synchronization primitives.

use std::sync::atomic::{AtomicU64, Ordering};

/// Global allocator operation counters.
pub struct HeapMetrics {
    /// Allocations served from a free-list (no system call).
    pub pool_hits: AtomicU64,
    /// Pooled-size allocations that missed the free-list.
    pub pool_misses: AtomicU64,
    /// Requests above the pooled range (always system-backed).
    pub unpooled_allocs: AtomicU64,
    /// Calls into the system allocator (alloc or realloc).
    pub system_calls: AtomicU64,
    /// Blocks released to the system allocator by drains.
    pub blocks_released: AtomicU64,
    /// Drains forced by the cache bound.
    pub bound_drains: AtomicU64,
    /// Explicit collect() calls.
    pub explicit_drains: AtomicU64,
    /// System-allocator failures recovered by drain-and-retry.
    pub oom_retries: AtomicU64,
}

impl HeapMetrics {
    /// Create a new zeroed metrics instance.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pool_hits: AtomicU64::new(0),
            pool_misses: AtomicU64::new(0),
            unpooled_allocs: AtomicU64::new(0),
            system_calls: AtomicU64::new(0),
            blocks_released: AtomicU64::new(0),
            bound_drains: AtomicU64::new(0),
            explicit_drains: AtomicU64::new(0),
            oom_retries: AtomicU64::new(0),
        }
    }

    /// Increment a counter by 1.
    pub fn inc(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Add `n` to a counter.
    pub fn add(counter: &AtomicU64, n: u64) {
        counter.fetch_add(n, Ordering::Relaxed);
    }

    /// Read a counter value.
    pub fn get(counter: &AtomicU64) -> u64 {
        counter.load(Ordering::Relaxed)
    }

    /// Snapshot all counters into a displayable summary.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            pool_hits: Self::get(&self.pool_hits),
            pool_misses: Self::get(&self.pool_misses),
            unpooled_allocs: Self::get(&self.unpooled_allocs),
            system_calls: Self::get(&self.system_calls),
            blocks_released: Self::get(&self.blocks_released),
            bound_drains: Self::get(&self.bound_drains),
            explicit_drains: Self::get(&self.explicit_drains),
            oom_retries: Self::get(&self.oom_retries),
        }
    }
}

impl Default for HeapMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time snapshot of all allocator counters.
#[derive(Debug, Clone, Copy)]
pub struct MetricsSnapshot {
    pub pool_hits: u64,
    pub pool_misses: u64,
    pub unpooled_allocs: u64,
    pub system_calls: u64,
    pub blocks_released: u64,
    pub bound_drains: u64,
    pub explicit_drains: u64,
    pub oom_retries: u64,
}

/// Global metrics instance.
static GLOBAL_METRICS: HeapMetrics = HeapMetrics::new();

/// Access the global metrics singleton.
#[must_use]
pub fn global_metrics() -> &'static HeapMetrics {
    &GLOBAL_METRICS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_start_at_zero() {
        let m = HeapMetrics::new();
        let snap = m.snapshot();
        assert_eq!(snap.pool_hits, 0);
        assert_eq!(snap.bound_drains, 0);
    }

    #[test]
    fn increment_and_add() {
        let m = HeapMetrics::new();
        HeapMetrics::inc(&m.pool_hits);
        HeapMetrics::inc(&m.pool_hits);
        HeapMetrics::add(&m.blocks_released, 7);
        let snap = m.snapshot();
        assert_eq!(snap.pool_hits, 2);
        assert_eq!(snap.blocks_released, 7);
    }
}
