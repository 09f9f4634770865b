//! Storefront Cache - response caching for a storefront API
//!
//! Provides a TTL cache with structured keys and prefix invalidation, an
//! admin facade over it, and a short-lived client-side cart mirror.

pub mod api;
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod tasks;

pub use api::{create_router, AppState};
pub use cache::{AdminCache, CacheKey, Invalidation, SharedCache};
pub use config::Config;
pub use error::{AppError, Result};
pub use tasks::spawn_cleanup_task;
