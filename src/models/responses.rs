//! Response DTOs for the admin API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::InterceptStats;

/// Response body for the stats endpoint (GET /_offline/stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Requests answered by the network
    pub network: u64,
    /// Network failures answered from cache
    pub cache_hits: u64,
    /// Network failures answered with the offline placeholder
    pub offline: u64,
    /// Requests not intercepted
    pub passthrough: u64,
    /// network + cache_hits + offline
    pub intercepted: u64,
    /// cache_hits / (cache_hits + offline)
    pub fallback_hit_rate: f64,
    /// Entries in the active store
    pub active_entries: usize,
}

impl StatsResponse {
    /// Creates a new StatsResponse from interception statistics
    pub fn new(stats: &InterceptStats, active_entries: usize) -> Self {
        Self {
            network: stats.network,
            cache_hits: stats.cache_hits,
            offline: stats.offline,
            passthrough: stats.passthrough,
            intercepted: stats.intercepted(),
            fallback_hit_rate: stats.fallback_hit_rate(),
            active_entries,
        }
    }
}

/// Response body for the health endpoint (GET /_offline/health)
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
