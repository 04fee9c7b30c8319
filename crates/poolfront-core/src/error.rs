//! Typed allocation failures.
//!
//! The heap's `try_*` entry points surface these instead of aborting;
//! the infallible entry points and the C ABI convert them into the
//! traditional fatal-on-OOM contract at the outermost edge.

use thiserror::Error;

/// Failure of an allocation or reallocation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AllocError {
    /// The system allocator failed twice: once cold, once after every
    /// cached block was drained back to it.
    #[error("out of memory: {size} byte request failed after draining {released} cached bytes")]
    OutOfMemory {
        /// Requested payload size in bytes.
        size: usize,
        /// Bytes released by the drain between the two attempts.
        released: usize,
    },
    /// The request is so large that header + rounded payload overflows
    /// `usize`; no allocator call was attempted.
    #[error("capacity overflow: {size} byte request cannot be sized as a block")]
    CapacityOverflow {
        /// Requested payload size in bytes.
        size: usize,
    },
}
