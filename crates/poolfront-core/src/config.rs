//! Runtime configuration.
//!
//! The per-thread cache bound is set via the `POOLFRONT_CACHE_LIMIT`
//! environment variable (bytes). It is read once on first use and
//! cached for the lifetime of the process; unparsable or missing
//! values fall back to the 16 MiB default.

use std::sync::OnceLock;

use crate::size_class::DEFAULT_CACHE_LIMIT;

/// Parse a cache limit from an env-var value (loose: trims whitespace,
/// rejects zero so the bound can never force a drain on every free).
#[must_use]
pub fn parse_cache_limit(raw: &str) -> Option<usize> {
    match raw.trim().parse::<usize>() {
        Ok(0) => None,
        Ok(n) => Some(n),
        Err(_) => None,
    }
}

static CACHE_LIMIT: OnceLock<usize> = OnceLock::new();

/// The configured cache bound in bytes (reads the env var on first
/// call, caches thereafter).
#[must_use]
pub fn cache_limit() -> usize {
    *CACHE_LIMIT.get_or_init(|| {
        std::env::var("POOLFRONT_CACHE_LIMIT")
            .ok()
            .and_then(|v| parse_cache_limit(&v))
            .unwrap_or(DEFAULT_CACHE_LIMIT)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid() {
        assert_eq!(parse_cache_limit("4096"), Some(4096));
        assert_eq!(parse_cache_limit("  1048576 "), Some(1 << 20));
    }

    #[test]
    fn parse_garbage_falls_back() {
        assert_eq!(parse_cache_limit(""), None);
        assert_eq!(parse_cache_limit("16MB"), None);
        assert_eq!(parse_cache_limit("-1"), None);
    }

    #[test]
    fn zero_is_rejected() {
        assert_eq!(parse_cache_limit("0"), None);
    }

    #[test]
    fn default_is_sane() {
        // Whatever the env says, the resolved limit is never zero.
        assert!(cache_limit() > 0);
    }
}
