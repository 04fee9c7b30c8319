//! Safe policy layer for the poolfront allocator.
//!
//! Everything here is pure arithmetic or lock-free bookkeeping; the
//! pointer-level machinery lives in `poolfront-heap`. This crate holds:
//! - **Size classes** (`size_class`): request size to class index mapping
//!   and block sizing, with compile-time sanity checks
//! - **Configuration** (`config`): runtime cache-limit control
//! - **Errors** (`error`): typed allocation failures
//! - **Metrics** (`metrics`): atomic counters for observability

#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod metrics;
pub mod size_class;

pub use error::AllocError;
pub use metrics::{HeapMetrics, MetricsSnapshot, global_metrics};
pub use size_class::{HEADER_SIZE, MAX_POOLED, NUM_CLASSES, STEP};
