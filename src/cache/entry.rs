//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::time::Duration;

// == Cache Entry ==
/// A single cached response and its expiry.
///
/// Entries are never mutated after creation; re-caching a key replaces the
/// whole entry, including its expiry.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<T> {
    /// The cached payload
    pub data: T,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: u64,
    /// Expiration timestamp (Unix milliseconds)
    pub expires_at: u64,
}

impl<T> CacheEntry<T> {
    // == Constructor ==
    /// Creates an entry written at `now_ms` that lives for `ttl`.
    pub fn new(data: T, now_ms: u64, ttl: Duration) -> Self {
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
        Self {
            data,
            created_at: now_ms,
            expires_at: now_ms.saturating_add(ttl_ms),
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired at `now_ms`.
    ///
    /// An entry is fresh only while `expires_at > now`; once the TTL has fully
    /// elapsed it is expired.
    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        now_ms >= self.expires_at
    }

    // == Time To Live ==
    /// Returns remaining TTL in milliseconds at `now_ms`, zero once expired.
    pub fn ttl_remaining_ms(&self, now_ms: u64) -> u64 {
        self.expires_at.saturating_sub(now_ms)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_creation() {
        let entry = CacheEntry::new("payload", 1_000, Duration::from_secs(60));

        assert_eq!(entry.data, "payload");
        assert_eq!(entry.created_at, 1_000);
        assert_eq!(entry.expires_at, 61_000);
        assert!(!entry.is_expired_at(1_000));
    }

    #[test]
    fn test_entry_expiration() {
        let entry = CacheEntry::new("payload", 0, Duration::from_millis(100));

        assert!(!entry.is_expired_at(99));
        assert!(entry.is_expired_at(101));
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let entry = CacheEntry::new("payload", 0, Duration::from_millis(100));

        // expiry > now is required for a hit
        assert!(entry.is_expired_at(100), "Entry should be expired at boundary");
    }

    #[test]
    fn test_zero_ttl_is_immediately_expired() {
        let entry = CacheEntry::new("payload", 500, Duration::ZERO);
        assert!(entry.is_expired_at(500));
    }

    #[test]
    fn test_ttl_remaining() {
        let entry = CacheEntry::new("payload", 0, Duration::from_secs(10));

        assert_eq!(entry.ttl_remaining_ms(4_000), 6_000);
        assert_eq!(entry.ttl_remaining_ms(20_000), 0);
    }

    #[test]
    fn test_huge_ttl_saturates() {
        let entry = CacheEntry::new("payload", 10, Duration::MAX);
        assert_eq!(entry.expires_at, u64::MAX);
        assert!(!entry.is_expired_at(u64::MAX - 1));
    }
}
