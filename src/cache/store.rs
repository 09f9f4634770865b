//! Cache Store Module
//!
//! The TTL response store: an ordered key map with lazy expiry, substring and
//! prefix invalidation, and an opt-in LRU capacity bound.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::time::Duration;

use tracing::debug;

use crate::cache::{CacheEntry, CacheStats, Invalidation, LruTracker, SharedClock};

// == Cache Store ==
/// Process-local response cache.
///
/// Keys live in a `BTreeMap` so that namespace and identity invalidations are
/// range scans rather than full scans. Expired entries are only removed when
/// they are read (or when [`CacheStore::cleanup_expired`] is called).
#[derive(Debug)]
pub struct CacheStore<V> {
    /// Key -> entry, ordered by key
    entries: BTreeMap<String, CacheEntry<V>>,
    /// Recency tracking, only maintained when a capacity is configured
    lru: LruTracker,
    /// Performance statistics
    stats: CacheStats,
    /// Optional upper bound on the number of entries
    max_entries: Option<usize>,
    /// Time source for expiry decisions
    clock: SharedClock,
}

impl<V: Clone> CacheStore<V> {
    // == Constructor ==
    /// Creates an unbounded store.
    pub fn new(clock: SharedClock) -> Self {
        Self::with_capacity(None, clock)
    }

    /// Creates a store that evicts the least recently used entry once
    /// `max_entries` is reached. `None` means unbounded.
    pub fn with_capacity(max_entries: Option<usize>, clock: SharedClock) -> Self {
        Self {
            entries: BTreeMap::new(),
            lru: LruTracker::new(),
            stats: CacheStats::new(),
            max_entries: max_entries.filter(|max| *max > 0),
            clock,
        }
    }

    // == Cache Response ==
    /// Stores `data` under `key` for `ttl` and hands `data` back.
    ///
    /// An existing entry under the same key is replaced together with its
    /// expiry.
    pub fn cache_response(&mut self, key: impl Into<String>, data: V, ttl: Duration) -> V {
        let key = key.into();
        let now = self.clock.now_ms();

        if let Some(max) = self.max_entries {
            if !self.entries.contains_key(&key) && self.entries.len() >= max {
                if let Some(evicted) = self.lru.evict_oldest() {
                    self.entries.remove(&evicted);
                    self.stats.record_eviction();
                    debug!(key = %evicted, "cache capacity reached, evicted");
                }
            }
            self.lru.touch(&key);
        }

        self.entries
            .insert(key, CacheEntry::new(data.clone(), now, ttl));
        self.stats.set_total_entries(self.entries.len());
        data
    }

    // == Get Cached Response ==
    /// Returns the cached data if present and not yet expired.
    ///
    /// Reading an expired entry removes it.
    pub fn get_cached_response(&mut self, key: &str) -> Option<V> {
        let now = self.clock.now_ms();

        let expired = match self.entries.get(key) {
            None => {
                self.stats.record_miss();
                return None;
            }
            Some(entry) => entry.is_expired_at(now),
        };

        if expired {
            self.entries.remove(key);
            self.lru.remove(key);
            self.stats.record_expiration();
            self.stats.record_miss();
            self.stats.set_total_entries(self.entries.len());
            debug!(key, "cache entry expired");
            return None;
        }

        if self.max_entries.is_some() {
            self.lru.touch(key);
        }
        self.stats.record_hit();
        self.entries.get(key).map(|entry| entry.data.clone())
    }

    /// Returns live data for `key` without recording statistics, touching
    /// recency or evicting.
    pub fn peek(&self, key: &str) -> Option<V> {
        let now = self.clock.now_ms();
        self.entries
            .get(key)
            .filter(|entry| !entry.is_expired_at(now))
            .map(|entry| entry.data.clone())
    }

    // == Clear Cache ==
    /// Removes every key containing `pattern`, or everything when `pattern` is
    /// `None`. Returns the number of removed entries.
    pub fn clear_cache(&mut self, pattern: Option<&str>) -> usize {
        match pattern {
            Some(pattern) => self.invalidate(&Invalidation::Substring(pattern.to_string())),
            None => self.invalidate(&Invalidation::All),
        }
    }

    // == Invalidate ==
    /// Applies an invalidation and returns how many entries it removed.
    ///
    /// Matching nothing is not an error.
    pub fn invalidate(&mut self, invalidation: &Invalidation) -> usize {
        let doomed: Vec<String> = match invalidation {
            Invalidation::All => self.entries.keys().cloned().collect(),
            Invalidation::Key(key) => self
                .entries
                .contains_key(key)
                .then(|| key.clone())
                .into_iter()
                .collect(),
            Invalidation::Prefix(prefix) => self
                .entries
                .range::<str, _>((Bound::Included(prefix.as_str()), Bound::Unbounded))
                .take_while(|(key, _)| key.starts_with(prefix.as_str()))
                .map(|(key, _)| key.clone())
                .collect(),
            Invalidation::Substring(pattern) => self
                .entries
                .keys()
                .filter(|key| key.contains(pattern.as_str()))
                .cloned()
                .collect(),
        };

        for key in &doomed {
            self.entries.remove(key);
            self.lru.remove(key);
        }

        let removed = doomed.len();
        self.stats.record_invalidations(removed);
        self.stats.set_total_entries(self.entries.len());
        debug!(?invalidation, removed, "cache invalidated");
        removed
    }

    // == Cleanup Expired ==
    /// Removes all expired entries. Returns the number removed.
    pub fn cleanup_expired(&mut self) -> usize {
        let now = self.clock.now_ms();
        let before = self.entries.len();

        let lru = &mut self.lru;
        self.entries.retain(|key, entry| {
            let keep = !entry.is_expired_at(now);
            if !keep {
                lru.remove(key);
            }
            keep
        });

        let removed = before - self.entries.len();
        for _ in 0..removed {
            self.stats.record_expiration();
        }
        self.stats.set_total_entries(self.entries.len());
        removed
    }

    /// Remaining lifetime of a live entry, without touching statistics.
    pub fn ttl_remaining(&self, key: &str) -> Option<Duration> {
        let now = self.clock.now_ms();
        self.entries
            .get(key)
            .filter(|entry| !entry.is_expired_at(now))
            .map(|entry| Duration::from_millis(entry.ttl_remaining_ms(now)))
    }

    /// Drops every entry and resets statistics.
    pub fn reset(&mut self) {
        self.entries.clear();
        self.lru.clear();
        self.stats = CacheStats::new();
    }

    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    /// Number of stored entries, expired-but-unread ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
