//! Shared utilities for the cache backends.

use std::time::Duration;

/// Convert a TTL in seconds to a lifetime.
///
/// `0` means the entry never expires.
pub fn ttl_duration(ttl_secs: u64) -> Option<Duration> {
    if ttl_secs == 0 {
        None
    } else {
        Some(Duration::from_secs(ttl_secs))
    }
}
