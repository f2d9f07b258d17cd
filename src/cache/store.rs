//! Cache Store Module
//!
//! A single named, versioned mapping from normalized request URL to response.

use std::collections::HashMap;

use crate::cache::CachedResponse;

// == Cache Store ==
/// One versioned cache store.
///
/// Keys are normalized absolute URLs. Entries never expire; the whole store
/// is dropped when its version is rotated out.
#[derive(Debug, Clone, Default)]
pub struct CacheStore {
    /// URL -> response storage
    entries: HashMap<String, CachedResponse>,
}

impl CacheStore {
    // == Constructor ==
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    // == Put ==
    /// Stores a response under `url`, replacing any previous entry.
    pub fn put(&mut self, url: impl Into<String>, response: CachedResponse) {
        self.entries.insert(url.into(), response);
    }

    // == Match ==
    /// Returns the stored response for `url`, if any.
    pub fn match_url(&self, url: &str) -> Option<&CachedResponse> {
        self.entries.get(url)
    }

    // == Length ==
    /// Returns the current number of entries in the store.
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    const INDEX: &str = "http://localhost/index.html";

    #[test]
    fn test_store_new() {
        let store = CacheStore::new();
        assert_eq!(store.len(), 0);
        assert!(store.match_url(INDEX).is_none());
    }

    #[test]
    fn test_store_put_and_match() {
        let mut store = CacheStore::new();

        store.put(INDEX, CachedResponse::new(200, "<html>"));
        let response = store.match_url(INDEX).unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_match_missing() {
        let store = CacheStore::new();
        assert!(store.match_url("http://localhost/unknown.js").is_none());
    }

    #[test]
    fn test_store_overwrite() {
        let mut store = CacheStore::new();

        store.put(INDEX, CachedResponse::new(200, "old"));
        store.put(INDEX, CachedResponse::new(200, "new"));

        assert_eq!(store.match_url(INDEX).unwrap().body, "new");
        assert_eq!(store.len(), 1);
    }
}
