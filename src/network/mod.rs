//! Network Module
//!
//! Outbound request description and the live fetch seam.

mod fetcher;
mod request;

pub use fetcher::{FetchError, Fetcher, HttpFetcher};
pub use request::{normalize_url, resolve, InterceptRequest};
