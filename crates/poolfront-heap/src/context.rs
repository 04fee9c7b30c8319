//! Thread-local pool access.
//!
//! Each thread owns an independent [`Pool`]; no locks, no cross-thread
//! visibility. The pool drains itself when the thread exits.

use std::cell::RefCell;

use crate::pool::Pool;

thread_local! {
    static POOL: RefCell<Pool> = RefCell::new(Pool::new());
}

/// Runs `f` with the calling thread's pool.
///
/// Reentrant calls are not supported (the pool is `RefCell`-guarded);
/// none of the allocator's operations nest.
pub fn with_pool<F, R>(f: F) -> R
where
    F: FnOnce(&mut Pool) -> R,
{
    POOL.with(|pool| f(&mut pool.borrow_mut()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_is_per_thread() {
        with_pool(|pool| assert_eq!(pool.cached_bytes(), 0));
        std::thread::spawn(|| {
            with_pool(|pool| assert_eq!(pool.cached_bytes(), 0));
        })
        .join()
        .expect("spawned thread");
    }
}
