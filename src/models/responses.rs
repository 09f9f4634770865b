//! Response DTOs for the storefront API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::CacheStats;

/// Response body for `GET /cache/stats`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub hits: u64,
    pub misses: u64,
    pub expirations: u64,
    pub invalidations: u64,
    pub evictions: u64,
    pub total_entries: usize,
    /// hits / (hits + misses)
    pub hit_rate: f64,
}

impl From<CacheStats> for StatsResponse {
    fn from(stats: CacheStats) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            hits: stats.hits,
            misses: stats.misses,
            expirations: stats.expirations,
            invalidations: stats.invalidations,
            evictions: stats.evictions,
            total_entries: stats.total_entries,
        }
    }
}

/// Response body for `DELETE /cache`.
#[derive(Debug, Clone, Serialize)]
pub struct ClearCacheResponse {
    /// Pattern that was applied, absent when everything was cleared
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Number of entries removed
    pub removed: usize,
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_response_from_stats() {
        let mut stats = CacheStats::new();
        stats.record_hit();
        stats.record_hit();
        stats.record_hit();
        stats.record_miss();
        stats.record_invalidations(2);

        let resp = StatsResponse::from(stats);
        assert!((resp.hit_rate - 0.75).abs() < 0.001);
        assert_eq!(resp.invalidations, 2);

        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["hitRate"], 0.75);
        assert_eq!(json["totalEntries"], 0);
    }

    #[test]
    fn test_clear_cache_response_omits_missing_pattern() {
        let resp = ClearCacheResponse {
            pattern: None,
            removed: 3,
        };
        assert_eq!(serde_json::to_string(&resp).unwrap(), r#"{"removed":3}"#);
    }

    #[test]
    fn test_health_response_serialize() {
        let json = serde_json::to_string(&HealthResponse::healthy()).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
    }

    #[test]
    fn test_error_response_serialize() {
        let json = serde_json::to_string(&ErrorResponse::new("Something went wrong")).unwrap();
        assert_eq!(json, r#"{"error":"Something went wrong"}"#);
    }
}
