//! Interception Statistics Module
//!
//! Tracks how intercepted requests were answered.

use serde::Serialize;

// == Intercept Stats ==
/// Counters for each way a request can be answered.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct InterceptStats {
    /// Requests answered by the live network
    pub network: u64,
    /// Network failures answered from the cache store
    pub cache_hits: u64,
    /// Network failures answered by the synthetic offline response
    pub offline: u64,
    /// Requests not intercepted
    pub passthrough: u64,
}

impl InterceptStats {
    // == Constructor ==
    /// Creates a new InterceptStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Fallback Hit Rate ==
    /// Share of network failures the cache could answer.
    ///
    /// Returns cache_hits / (cache_hits + offline), or 0.0 if the network never failed.
    pub fn fallback_hit_rate(&self) -> f64 {
        let total = self.cache_hits + self.offline;
        if total == 0 {
            0.0
        } else {
            self.cache_hits as f64 / total as f64
        }
    }

    /// Total intercepted requests (pass-throughs excluded).
    pub fn intercepted(&self) -> u64 {
        self.network + self.cache_hits + self.offline
    }

    pub fn record_network(&mut self) {
        self.network += 1;
    }

    pub fn record_cache_hit(&mut self) {
        self.cache_hits += 1;
    }

    pub fn record_offline(&mut self) {
        self.offline += 1;
    }

    pub fn record_passthrough(&mut self) {
        self.passthrough += 1;
    }
}
