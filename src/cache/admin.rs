//! Admin Cache Facade
//!
//! Whole-resource caching for back-office list endpoints, namespaced under
//! `admin:`. One entry per endpoint; no per-filter variants.

use std::future::Future;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::cache::keys::admin_key;
use crate::cache::{Invalidation, SharedCache};

/// Default lifetime of an admin list entry (5 minutes).
pub const DEFAULT_ADMIN_TTL: Duration = Duration::from_millis(300_000);

// == Admin Cache ==
#[derive(Clone, Debug)]
pub struct AdminCache {
    cache: SharedCache,
    ttl: Duration,
}

impl AdminCache {
    /// Wraps `cache` using [`DEFAULT_ADMIN_TTL`].
    pub fn new(cache: SharedCache) -> Self {
        Self::with_ttl(cache, DEFAULT_ADMIN_TTL)
    }

    pub fn with_ttl(cache: SharedCache, ttl: Duration) -> Self {
        Self { cache, ttl }
    }

    /// Caches `data` as the whole `endpoint` resource and returns it.
    pub async fn cache_admin_response<T: Serialize>(&self, endpoint: &str, data: T) -> T {
        self.cache_admin_response_for(endpoint, data, self.ttl).await
    }

    /// Like [`AdminCache::cache_admin_response`] with an explicit TTL.
    pub async fn cache_admin_response_for<T: Serialize>(
        &self,
        endpoint: &str,
        data: T,
        ttl: Duration,
    ) -> T {
        self.cache
            .cache_response(&admin_key(endpoint), data, ttl)
            .await
    }

    pub async fn get_admin_cache<T: DeserializeOwned>(&self, endpoint: &str) -> Option<T> {
        self.cache.get_cached_response(&admin_key(endpoint)).await
    }

    /// Drops one admin resource, or every `admin:` entry when `endpoint` is
    /// `None`. Entries outside the admin namespace are never touched.
    pub async fn clear_admin_cache(&self, endpoint: Option<&str>) -> usize {
        self.cache.invalidate(&Invalidation::admin(endpoint)).await
    }

    /// Reads `endpoint` through the cache, fetching it on a miss.
    pub async fn get_or_fetch<T, E, F, Fut>(&self, endpoint: &str, fetch: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.cache
            .get_or_fetch(&admin_key(endpoint), self.ttl, fetch)
            .await
    }
}
