//! API Module
//!
//! HTTP handlers and routing for the offline cache proxy.
//!
//! # Endpoints
//! - `GET /_offline/health` - Health check endpoint
//! - `GET /_offline/stats` - Interception statistics
//! - `GET /_offline/status` - Lifecycle state
//! - `PUT /_offline/version` - Register a new cache version
//! - everything else - proxied network-first with offline fallback

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::{create_router, ADMIN_PREFIX};
