//! API Routes
//!
//! Configures the Axum router: admin endpoints plus the proxy fallback.

use axum::{
    routing::{get, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    health_handler, proxy_handler, register_version_handler, stats_handler, status_handler,
    AppState,
};

/// Prefix reserved for admin endpoints; never proxied
pub const ADMIN_PREFIX: &str = "/_offline";

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /_offline/health` - Health check endpoint
/// - `GET /_offline/stats` - Interception statistics
/// - `GET /_offline/status` - Lifecycle state and store names
/// - `PUT /_offline/version` - Register a new cache version
/// - anything else - proxied through the offline cache
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let admin = Router::new()
        .route("/health", get(health_handler))
        .route("/stats", get(stats_handler))
        .route("/status", get(status_handler))
        .route("/version", put(register_version_handler))
        .layer(cors);

    Router::new()
        .nest(ADMIN_PREFIX, admin)
        .fallback(proxy_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
