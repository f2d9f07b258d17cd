//! API Handlers
//!
//! The proxy fallback handler and the admin endpoints.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, Method},
    response::{IntoResponse, Response},
    Json,
};
use tracing::debug;
use url::Url;

use crate::cache::strip_hop_by_hop;
use crate::error::{CacheError, Result};
use crate::models::{HealthResponse, RegisterVersionRequest, StatsResponse};
use crate::network::InterceptRequest;
use crate::worker::{
    OfflineCacheManager, RegistrationReport, StatusSnapshot, WorkerHandle, WorkerVersion,
};

/// Largest request body buffered for forwarding
pub const MAX_BODY_SIZE: usize = 8 * 1024 * 1024;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Manager, for introspection and pass-through
    pub manager: Arc<OfflineCacheManager>,
    /// Event loop handle every intercepted request goes through
    pub worker: WorkerHandle,
    /// Resources seeded when a registration names none
    pub default_resources: Vec<String>,
}

impl AppState {
    /// Creates a new AppState.
    pub fn new(
        manager: Arc<OfflineCacheManager>,
        worker: WorkerHandle,
        default_resources: Vec<String>,
    ) -> Self {
        Self {
            manager,
            worker,
            default_resources,
        }
    }
}

/// Fallback handler for every non-admin request.
///
/// Intercepted requests are answered by the worker; everything else is
/// forwarded upstream unchanged.
pub async fn proxy_handler(State(state): State<AppState>, request: Request) -> Result<Response> {
    let request = to_intercept_request(state.manager.base_url(), request).await?;

    let outcome = state.worker.fetch(request.clone()).await?;
    debug!("{} {} answered by {}", request.method, request.url, outcome.source());

    match outcome.served() {
        Some(response) => Ok(response.into_response()),
        None => {
            let upstream = state.manager.pass_through(&request).await?;
            let length = upstream.headers.get(header::CONTENT_LENGTH).cloned();
            let mut response = upstream.into_response();
            // A HEAD response has no body to measure, so keep the upstream's length.
            if request.method == Method::HEAD {
                if let Some(length) = length {
                    response.headers_mut().insert(header::CONTENT_LENGTH, length);
                }
            }
            Ok(response)
        }
    }
}

/// Maps an incoming request onto the upstream origin.
async fn to_intercept_request(base: &Url, request: Request) -> Result<InterceptRequest> {
    let (parts, body) = request.into_parts();

    // Only path and query are taken from the client; the origin is fixed.
    let mut url = base.clone();
    url.set_path(parts.uri.path());
    url.set_query(parts.uri.query());

    let body = axum::body::to_bytes(body, MAX_BODY_SIZE)
        .await
        .map_err(|e| CacheError::InvalidRequest(format!("Unreadable body: {}", e)))?;

    Ok(InterceptRequest {
        method: parts.method,
        url,
        headers: forwardable_headers(parts.headers),
        body,
    })
}

/// Drops headers the outbound client sets itself.
fn forwardable_headers(mut headers: HeaderMap) -> HeaderMap {
    strip_hop_by_hop(&mut headers);
    headers.remove(header::HOST);
    headers.remove(header::CONTENT_LENGTH);
    headers
}

/// Handler for PUT /_offline/version
///
/// Installs and activates a new cache version, rotating out the old store.
pub async fn register_version_handler(
    State(state): State<AppState>,
    Json(req): Json<RegisterVersionRequest>,
) -> Result<Json<RegistrationReport>> {
    // Validate request
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let resources = req
        .essential_resources
        .unwrap_or_else(|| state.default_resources.clone());
    let report = state
        .worker
        .register(WorkerVersion::new(req.version, resources))
        .await?;

    Ok(Json(report))
}

/// Handler for GET /_offline/status
pub async fn status_handler(State(state): State<AppState>) -> Json<StatusSnapshot> {
    Json(state.manager.status().await)
}

/// Handler for GET /_offline/stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let stats = state.manager.stats().await;
    let entries = state.manager.active_entry_count().await;

    Json(StatsResponse::new(&stats, entries))
}

/// Handler for GET /_offline/health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
