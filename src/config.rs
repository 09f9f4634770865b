//! Configuration Module
//!
//! Handles loading and managing service configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Service configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Lifetime of a cached product detail
    pub product_ttl: Duration,
    /// Lifetime of a cached product listing page
    pub product_list_ttl: Duration,
    /// Lifetime of a cached cart snapshot
    pub cart_ttl: Duration,
    /// Lifetime of a cached admin list
    pub admin_ttl: Duration,
    /// Capacity bound for the response cache, None = unbounded
    pub max_entries: Option<usize>,
    /// Interval of the background expiry sweep, None = lazy expiry only
    pub sweep_interval: Option<Duration>,
    /// Whether product writes also drop every cached product listing
    pub invalidate_lists_on_product_write: bool,
    /// Freshness window of the client-side cart mirror
    pub cart_mirror_duration: Duration,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `PRODUCT_TTL_MS` - Product detail TTL (default: 600000)
    /// - `PRODUCT_LIST_TTL_MS` - Product listing TTL (default: 300000)
    /// - `CART_TTL_MS` - Cart snapshot TTL (default: 60000)
    /// - `ADMIN_TTL_MS` - Admin list TTL (default: 300000)
    /// - `CACHE_MAX_ENTRIES` - Capacity bound (default: unbounded; 0 also means unbounded)
    /// - `CACHE_SWEEP_INTERVAL` - Sweep interval in seconds (default: 0, disabled)
    /// - `INVALIDATE_LISTS_ON_PRODUCT_WRITE` - true/false (default: true)
    /// - `CART_MIRROR_DURATION_MS` - Client mirror freshness (default: 15000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: env_parse("SERVER_PORT").unwrap_or(defaults.server_port),
            product_ttl: env_millis("PRODUCT_TTL_MS").unwrap_or(defaults.product_ttl),
            product_list_ttl: env_millis("PRODUCT_LIST_TTL_MS")
                .unwrap_or(defaults.product_list_ttl),
            cart_ttl: env_millis("CART_TTL_MS").unwrap_or(defaults.cart_ttl),
            admin_ttl: env_millis("ADMIN_TTL_MS").unwrap_or(defaults.admin_ttl),
            max_entries: env_parse::<usize>("CACHE_MAX_ENTRIES").filter(|max| *max > 0),
            sweep_interval: env_parse::<u64>("CACHE_SWEEP_INTERVAL")
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
            invalidate_lists_on_product_write: env_parse("INVALIDATE_LISTS_ON_PRODUCT_WRITE")
                .unwrap_or(defaults.invalidate_lists_on_product_write),
            cart_mirror_duration: env_millis("CART_MIRROR_DURATION_MS")
                .unwrap_or(defaults.cart_mirror_duration),
        }
    }
}

fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

fn env_millis(name: &str) -> Option<Duration> {
    env_parse::<u64>(name).map(Duration::from_millis)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            product_ttl: Duration::from_millis(600_000),
            product_list_ttl: Duration::from_millis(300_000),
            cart_ttl: Duration::from_millis(60_000),
            admin_ttl: Duration::from_millis(300_000),
            max_entries: None,
            sweep_interval: None,
            invalidate_lists_on_product_write: true,
            cart_mirror_duration: Duration::from_millis(15_000),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.product_ttl, Duration::from_secs(600));
        assert_eq!(config.admin_ttl, Duration::from_secs(300));
        assert_eq!(config.cart_mirror_duration, Duration::from_secs(15));
        assert!(config.max_entries.is_none());
        assert!(config.sweep_interval.is_none());
        assert!(config.invalidate_lists_on_product_write);
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        for name in [
            "SERVER_PORT",
            "PRODUCT_TTL_MS",
            "PRODUCT_LIST_TTL_MS",
            "CART_TTL_MS",
            "ADMIN_TTL_MS",
            "CACHE_MAX_ENTRIES",
            "CACHE_SWEEP_INTERVAL",
            "INVALIDATE_LISTS_ON_PRODUCT_WRITE",
            "CART_MIRROR_DURATION_MS",
        ] {
            env::remove_var(name);
        }

        assert_eq!(Config::from_env(), Config::default());
    }
}
