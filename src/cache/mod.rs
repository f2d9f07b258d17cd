//! Cache Module
//!
//! Versioned cache stores keyed by normalized request URL.

mod response;
mod stats;
mod storage;
mod store;

// Re-export public types
pub use response::{
    strip_hop_by_hop, CachedResponse, OFFLINE_BODY, OFFLINE_STATUS, OFFLINE_STATUS_TEXT,
};
pub use stats::InterceptStats;
pub use storage::{CacheStorage, MemoryCacheStorage};
pub use store::CacheStore;
