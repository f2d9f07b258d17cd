//! Cached Response Module
//!
//! Defines the stored form of an HTTP response and the synthetic offline placeholder.

use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use bytes::Bytes;

// == Constants ==
/// Status code of the synthetic offline response
pub const OFFLINE_STATUS: u16 = 503;

/// Status text of the synthetic offline response
pub const OFFLINE_STATUS_TEXT: &str = "Service Unavailable";

/// Body of the synthetic offline response
pub const OFFLINE_BODY: &str = "Offline - Please check your connection";

/// Headers that describe a single connection and never travel past a proxy.
const HOP_BY_HOP_HEADERS: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

// == Cached Response ==
/// A fully buffered HTTP response, live or stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResponse {
    /// HTTP status code
    pub status: u16,
    /// Reason phrase
    pub status_text: String,
    /// Response headers as received, raw value bytes included
    pub headers: HeaderMap,
    /// Response body
    pub body: Bytes,
}

impl CachedResponse {
    // == Constructor ==
    /// Creates a response with the canonical reason phrase for `status`.
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        let status_text = StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or_default()
            .to_string();

        Self {
            status,
            status_text,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    /// Adds a header, returning self for chaining.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    // == Offline Placeholder ==
    /// Synthesizes the response served when neither network nor cache can answer.
    pub fn offline() -> Self {
        Self {
            status: OFFLINE_STATUS,
            status_text: OFFLINE_STATUS_TEXT.to_string(),
            headers: HeaderMap::new(),
            body: Bytes::from_static(OFFLINE_BODY.as_bytes()),
        }
        .with_header(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        )
    }

    /// True for 2xx statuses.
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Removes every hop-by-hop header from `headers`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    for name in HOP_BY_HOP_HEADERS {
        headers.remove(name);
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CachedResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::BAD_GATEWAY);
        let mut headers = self.headers;
        strip_hop_by_hop(&mut headers);
        // Framing is recomputed from the buffered body.
        headers.remove(header::CONTENT_LENGTH);

        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        response
    }
}
