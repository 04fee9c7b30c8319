//! poolfront heap: a fixed-size-class free-list cache in front of the
//! system allocator.
//!
//! Small allocations (up to 2 KiB) are bucketed into 16-byte size
//! classes. Freeing a pooled block pushes it onto a per-thread,
//! per-class free-list instead of returning it to the system; the next
//! allocation of the same class pops it back off with no system call.
//! Larger requests pass straight through. Each thread's cache is
//! bounded (`bounded-cache` feature, on by default): crossing the
//! bound drains the whole cache back to the system allocator, and a
//! failed system call drains and retries once before giving up.
//!
//! # Architecture
//!
//! - **Block layout** (`block`): header-prefixed blocks and the
//!   free-list link reinterpretation — the only unsafe pointer code
//! - **Pool** (`pool`): per-class intrusive free-lists with cached-byte
//!   accounting and drain
//! - **Operations** (`ops`): allocate / reallocate / free and the
//!   diagnostics, with layered OOM recovery
//! - **Context** (`context`): the thread-local pool
//!
//! A block freed on a thread other than the one that allocated it is
//! out of contract: free-lists are thread-private and unsynchronized
//! by design.

pub mod block;
pub mod context;
pub mod ops;
pub mod pool;

pub use ops::{
    allocate, cached_bytes, collect, free, reallocate, try_allocate, try_reallocate, usable_size,
};
pub use pool::Pool;
