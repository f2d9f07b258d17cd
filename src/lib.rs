//! Offline Cache - a network-first caching proxy
//!
//! Serves live responses when the upstream is reachable and falls back to a
//! versioned cache store, then to a synthetic offline response, when it is not.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod network;
pub mod relay;
pub mod worker;

pub use api::AppState;
pub use config::Config;
pub use worker::{spawn_event_loop, OfflineCacheManager, WorkerHandle, WorkerVersion};
