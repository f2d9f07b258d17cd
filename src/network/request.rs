//! Intercepted Request Module
//!
//! Describes an outbound request and decides whether it may be intercepted.

use axum::http::{HeaderMap, Method};
use bytes::Bytes;
use url::Url;

use crate::error::{CacheError, Result};

// == Intercept Request ==
/// An outbound request as seen by the cache manager.
#[derive(Debug, Clone)]
pub struct InterceptRequest {
    /// HTTP method
    pub method: Method,
    /// Absolute target URL
    pub url: Url,
    /// Request headers forwarded to the network
    pub headers: HeaderMap,
    /// Request body, empty for GET
    pub body: Bytes,
}

impl InterceptRequest {
    /// Creates a request with no headers and no body.
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    /// Creates a GET request for `url`.
    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    /// Parses `url` and creates a request with the given method.
    pub fn parse(method: Method, url: &str) -> Result<Self> {
        let url = Url::parse(url).map_err(|e| CacheError::InvalidUrl(format!("{}: {}", url, e)))?;
        Ok(Self::new(method, url))
    }

    // == Eligibility ==
    /// Only GET requests over http or https are intercepted.
    pub fn is_eligible(&self) -> bool {
        self.method == Method::GET && matches!(self.url.scheme(), "http" | "https")
    }

    // == Cache Key ==
    /// Normalized URL used as the cache store key.
    pub fn cache_key(&self) -> String {
        normalize_url(&self.url)
    }
}

/// Normalizes a URL into a cache key. Fragments never reach the network,
/// so they are dropped.
pub fn normalize_url(url: &Url) -> String {
    let mut url = url.clone();
    url.set_fragment(None);
    url.to_string()
}

/// Resolves `path` against `base`, accepting absolute URLs unchanged.
pub fn resolve(base: &Url, path: &str) -> Result<Url> {
    base.join(path)
        .map_err(|e| CacheError::InvalidUrl(format!("{}: {}", path, e)))
}
