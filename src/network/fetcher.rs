//! Network Fetcher Module
//!
//! Performs live requests. Any HTTP status is a successful fetch; only
//! transport-level failures are errors.

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::cache::CachedResponse;
use crate::error::CacheError;
use crate::network::InterceptRequest;

// == Fetch Error ==
/// Transport-level failure of a live request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Connection, DNS, TLS or body transfer failure
    #[error("Network error: {0}")]
    Network(String),

    /// Live attempt exceeded the configured bound
    #[error("Network timeout after {0} ms")]
    Timeout(u64),
}

// == Fetcher Trait ==
/// Abstraction over the live network for testability.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Issues `request` and buffers the full response.
    async fn fetch(&self, request: &InterceptRequest) -> Result<CachedResponse, FetchError>;
}

// == HTTP Fetcher ==
/// Default fetcher using `reqwest`.
///
/// Redirects are never followed: a 3xx is a response like any other and
/// reaches the client as-is.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Creates a fetcher with the default client settings.
    pub fn new() -> Result<Self, CacheError> {
        let client = Self::client_builder()
            .build()
            .map_err(|e| CacheError::Internal(format!("HTTP client setup failed: {}", e)))?;
        Ok(Self { client })
    }

    /// Client settings every fetcher relies on, for callers tuning their own.
    pub fn client_builder() -> reqwest::ClientBuilder {
        reqwest::Client::builder().redirect(reqwest::redirect::Policy::none())
    }

    /// Creates a fetcher around a preconfigured client.
    ///
    /// Build the client from `client_builder` to keep redirects unfollowed.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &InterceptRequest) -> Result<CachedResponse, FetchError> {
        let mut builder = self
            .client
            .request(request.method.clone(), request.url.clone())
            .headers(request.headers.clone());
        if !request.body.is_empty() {
            builder = builder.body(request.body.clone());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();
        let headers = response.headers().clone();

        // A body that dies mid-transfer is a transport failure too.
        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        debug!("Fetched {} -> {}", request.url, status);

        Ok(CachedResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        http::{header, HeaderValue, Method, StatusCode},
        response::IntoResponse,
        routing::get,
        Router,
    };

    async fn serve(app: Router) -> std::net::SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_error() {
        // Bind then drop to get a port nothing listens on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let fetcher = HttpFetcher::new().unwrap();
        let request =
            InterceptRequest::parse(Method::GET, &format!("http://{}/index.html", addr)).unwrap();

        let result = fetcher.fetch(&request).await;
        assert!(matches!(result, Err(FetchError::Network(_))));
    }

    #[test]
    fn test_fetch_error_display() {
        assert_eq!(
            FetchError::Timeout(250).to_string(),
            "Network timeout after 250 ms"
        );
    }

    #[tokio::test]
    async fn test_redirect_is_returned_not_followed() {
        let addr = serve(
            Router::new()
                .route(
                    "/old",
                    get(|| async { (StatusCode::FOUND, [(header::LOCATION, "/new")]) }),
                )
                .route("/new", get(|| async { "new page" })),
        )
        .await;

        let fetcher = HttpFetcher::new().unwrap();
        let request =
            InterceptRequest::parse(Method::GET, &format!("http://{}/old", addr)).unwrap();
        let response = fetcher.fetch(&request).await.unwrap();

        assert_eq!(response.status, 302);
        assert_eq!(response.headers.get(header::LOCATION).unwrap(), "/new");
        assert!(response.body.is_empty());
    }

    #[tokio::test]
    async fn test_opaque_header_bytes_are_kept() {
        let addr = serve(Router::new().route(
            "/",
            get(|| async {
                let value = HeaderValue::from_bytes(b"caf\xe9").unwrap();
                (StatusCode::OK, [("x-legacy", value)], "ok").into_response()
            }),
        ))
        .await;

        let fetcher = HttpFetcher::new().unwrap();
        let request = InterceptRequest::parse(Method::GET, &format!("http://{}/", addr)).unwrap();
        let response = fetcher.fetch(&request).await.unwrap();

        assert_eq!(
            response.headers.get("x-legacy").unwrap().as_bytes(),
            b"caf\xe9"
        );
    }
}
