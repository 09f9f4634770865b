//! Shared Cache Handle
//!
//! The process-wide response cache as handed to route handlers: a cloneable
//! handle over one [`CacheStore`] holding JSON payloads, plus per-key
//! single-flight so concurrent misses share one upstream fetch.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing::{debug, info, warn};

use crate::cache::{CacheStats, CacheStore, Invalidation, SharedClock};
use crate::config::Config;

type InflightMap = Arc<StdMutex<HashMap<String, Arc<Mutex<()>>>>>;

// == Shared Cache ==
/// Cloneable handle to the process's response cache.
///
/// Created explicitly and injected where needed; [`SharedCache::dispose`]
/// ends its useful life.
#[derive(Clone, Debug)]
pub struct SharedCache {
    store: Arc<RwLock<CacheStore<Value>>>,
    inflight: InflightMap,
}

impl SharedCache {
    // == Constructor ==
    /// Creates a cache with an optional capacity bound.
    pub fn new(max_entries: Option<usize>, clock: SharedClock) -> Self {
        Self {
            store: Arc::new(RwLock::new(CacheStore::with_capacity(max_entries, clock))),
            inflight: Arc::default(),
        }
    }

    /// Creates a cache from configuration.
    pub fn from_config(config: &Config, clock: SharedClock) -> Self {
        Self::new(config.max_entries, clock)
    }

    // == Cache Response ==
    /// Stores `data` under `key` for `ttl` and returns it unchanged.
    ///
    /// A payload that cannot be encoded is simply not cached.
    pub async fn cache_response<T: Serialize>(&self, key: &str, data: T, ttl: Duration) -> T {
        match serde_json::to_value(&data) {
            Ok(value) => {
                self.store.write().await.cache_response(key, value, ttl);
                debug!(key, ttl_ms = ttl.as_millis() as u64, "cached response");
            }
            Err(err) => warn!(key, error = %err, "response not cacheable, skipping"),
        }
        data
    }

    // == Get Cached Response ==
    /// Returns the cached payload for `key`, or `None` on a miss.
    ///
    /// A payload that does not decode as `T` is treated as a miss and dropped.
    pub async fn get_cached_response<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.store.write().await.get_cached_response(key)?;
        self.decode(key, value).await
    }

    async fn decode<T: DeserializeOwned>(&self, key: &str, value: Value) -> Option<T> {
        match serde_json::from_value(value) {
            Ok(data) => {
                debug!(key, "cache hit");
                Some(data)
            }
            Err(err) => {
                warn!(key, error = %err, "cached payload has unexpected shape, dropping");
                self.invalidate(&Invalidation::Key(key.to_string())).await;
                None
            }
        }
    }

    // == Get Or Fetch ==
    /// Returns the cached value for `key`, fetching and caching it on a miss.
    ///
    /// Concurrent misses for the same key wait for the first caller's fetch
    /// instead of issuing their own. A fetch error is returned unchanged and
    /// nothing is cached; waiters then fetch for themselves.
    pub async fn get_or_fetch<T, E, F, Fut>(&self, key: &str, ttl: Duration, fetch: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(hit) = self.get_cached_response(key).await {
            return Ok(hit);
        }

        let _flight = self.join_flight(key).await;

        // Another caller may have filled the entry while we waited
        let filled = self.store.read().await.peek(key);
        if let Some(value) = filled {
            if let Some(hit) = self.decode(key, value).await {
                return Ok(hit);
            }
        }

        debug!(key, "cache miss, fetching");
        let data = fetch().await?;
        Ok(self.cache_response(key, data, ttl).await)
    }

    async fn join_flight(&self, key: &str) -> FlightGuard {
        let gate = {
            let mut map = self.inflight.lock().unwrap_or_else(|e| e.into_inner());
            map.entry(key.to_string()).or_default().clone()
        };
        let permit = gate.clone().lock_owned().await;
        FlightGuard {
            inflight: self.inflight.clone(),
            key: key.to_string(),
            gate,
            permit: Some(permit),
        }
    }

    // == Clear Cache ==
    /// Removes every key containing `pattern`, or everything.
    pub async fn clear_cache(&self, pattern: Option<&str>) -> usize {
        self.invalidate(&Invalidation::pattern(pattern)).await
    }

    /// Applies one invalidation and returns how many entries it removed.
    pub async fn invalidate(&self, invalidation: &Invalidation) -> usize {
        self.store.write().await.invalidate(invalidation)
    }

    /// Applies several invalidations under one lock.
    pub async fn invalidate_all(&self, invalidations: &[Invalidation]) -> usize {
        let mut store = self.store.write().await;
        invalidations.iter().map(|inv| store.invalidate(inv)).sum()
    }

    /// Removes expired entries without waiting for them to be read.
    pub async fn cleanup_expired(&self) -> usize {
        self.store.write().await.cleanup_expired()
    }

    pub async fn stats(&self) -> CacheStats {
        self.store.read().await.stats()
    }

    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.store.read().await.is_empty()
    }

    // == Dispose ==
    /// Drops every entry and statistic. The handle stays usable and starts
    /// from empty.
    pub async fn dispose(&self) {
        self.store.write().await.reset();
        self.inflight
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
        info!("response cache disposed");
    }
}

// == Flight Guard ==
/// Holds the per-key fetch permit; removes the gate once nobody waits on it.
struct FlightGuard {
    inflight: InflightMap,
    key: String,
    gate: Arc<Mutex<()>>,
    permit: Option<OwnedMutexGuard<()>>,
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        // Release the permit first so its Arc is not counted below
        self.permit.take();

        let mut map = self.inflight.lock().unwrap_or_else(|e| e.into_inner());
        let idle = Arc::strong_count(&self.gate) <= 2;
        if idle && map.get(&self.key).is_some_and(|g| Arc::ptr_eq(g, &self.gate)) {
            map.remove(&self.key);
        }
    }
}
