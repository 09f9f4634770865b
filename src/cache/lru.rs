//! LRU Tracker Module
//!
//! Recency bookkeeping for the optional bounded-capacity mode of the store.

use std::collections::{BTreeMap, HashMap};

// == LRU Tracker ==
/// Tracks access order for LRU eviction.
///
/// Every touch stamps the key with a monotonically increasing sequence number;
/// the smallest live stamp is the least recently used key.
#[derive(Debug, Default)]
pub struct LruTracker {
    /// Sequence number -> key, oldest first
    order: BTreeMap<u64, String>,
    /// Key -> its current sequence number
    stamps: HashMap<String, u64>,
    /// Next sequence number to hand out
    next_seq: u64,
}

impl LruTracker {
    // == Constructor ==
    /// Creates a new empty LRU tracker.
    pub fn new() -> Self {
        Self::default()
    }

    // == Touch ==
    /// Marks a key as most recently used.
    pub fn touch(&mut self, key: &str) {
        if let Some(old) = self.stamps.get(key).copied() {
            self.order.remove(&old);
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.order.insert(seq, key.to_string());
        self.stamps.insert(key.to_string(), seq);
    }

    // == Remove ==
    /// Stops tracking a key. Unknown keys are ignored.
    pub fn remove(&mut self, key: &str) {
        if let Some(seq) = self.stamps.remove(key) {
            self.order.remove(&seq);
        }
    }

    // == Evict Oldest ==
    /// Removes and returns the least recently used key.
    pub fn evict_oldest(&mut self) -> Option<String> {
        let (_, key) = self.order.pop_first()?;
        self.stamps.remove(&key);
        Some(key)
    }

    /// Forgets every key.
    pub fn clear(&mut self) {
        self.order.clear();
        self.stamps.clear();
    }

    /// Returns the number of tracked keys.
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.stamps.len()
    }
}
