//! Response DTOs for the query cache API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;
use serde_json::Value;

use crate::cache::CacheStats;
use crate::query::Source;

/// Response body for POST /query and POST /refetch
#[derive(Debug, Clone, Serialize)]
pub struct QueryResponse {
    /// The resolved payload
    pub data: Value,
    /// Whether it came from cache or network
    pub source: Source,
}

impl QueryResponse {
    pub fn new(data: Value, source: Source) -> Self {
        Self { data, source }
    }
}

/// Response body for POST /invalidate
#[derive(Debug, Clone, Serialize)]
pub struct InvalidateResponse {
    /// Whether the cache no longer holds the request
    pub invalidated: bool,
    /// Logical key of the invalidated request
    pub key: String,
}

impl InvalidateResponse {
    pub fn new(invalidated: bool, key: impl Into<String>) -> Self {
        Self {
            invalidated,
            key: key.into(),
        }
    }
}

/// Response body for DELETE /cache/:collection
#[derive(Debug, Clone, Serialize)]
pub struct ClearResponse {
    /// Success message
    pub message: String,
    /// The collection that was cleared
    pub collection: String,
}

impl ClearResponse {
    pub fn new(collection: impl Into<String>) -> Self {
        let collection = collection.into();
        Self {
            message: format!("Collection '{}' cleared", collection),
            collection,
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Number of cache hits
    pub hits: u64,
    /// Number of cache misses
    pub misses: u64,
    /// Number of evicted entries
    pub evictions: u64,
    /// Number of entries written
    pub inserts: u64,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl From<CacheStats> for StatsResponse {
    fn from(stats: CacheStats) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            hits: stats.hits,
            misses: stats.misses,
            evictions: stats.evictions,
            inserts: stats.inserts,
        }
    }
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
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_response_serialize() {
        let resp = QueryResponse::new(json!({"users": []}), Source::Cache);
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json, json!({"data": {"users": []}, "source": "cache"}));
    }

    #[test]
    fn test_clear_response_serialize() {
        let resp = ClearResponse::new("default cache");
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("default cache"));
        assert!(json.contains("cleared"));
    }

    #[test]
    fn test_stats_response_hit_rate() {
        let resp = StatsResponse::from(CacheStats {
            hits: 80,
            misses: 20,
            evictions: 5,
            inserts: 20,
        });
        assert!((resp.hit_rate - 0.8).abs() < 0.001);
    }

    #[test]
    fn test_stats_response_zero_requests() {
        let resp = StatsResponse::from(CacheStats::default());
        assert_eq!(resp.hit_rate, 0.0);
    }

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::healthy();
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
    }

    #[test]
    fn test_error_response_serialize() {
        let resp = ErrorResponse::new("Something went wrong");
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("error"));
        assert!(json.contains("Something went wrong"));
    }
}
