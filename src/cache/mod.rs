//! Cache Module
//!
//! In-process response caching: a TTL store with lazy expiry, the key scheme
//! for every cached resource, invalidation rules for writes, and the admin
//! facade.

pub mod admin;
mod clock;
mod entry;
pub mod invalidation;
pub mod keys;
mod lru;
mod shared;
mod stats;
mod store;


// Re-export public types
pub use admin::{AdminCache, DEFAULT_ADMIN_TTL};
pub use clock::{system_clock, Clock, ManualClock, SharedClock, SystemClock};
pub use entry::CacheEntry;
pub use invalidation::Invalidation;
pub use keys::CacheKey;
pub use lru::LruTracker;
pub use shared::SharedCache;
pub use stats::CacheStats;
pub use store::CacheStore;
