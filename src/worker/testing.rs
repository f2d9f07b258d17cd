//! Test doubles for the storage and network seams.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::cache::{CacheStorage, CachedResponse, MemoryCacheStorage};
use crate::error::{CacheError, Result};
use crate::network::{normalize_url, FetchError, Fetcher, InterceptRequest};

/// Fetcher answering from a fixed URL -> response table.
pub struct MockFetcher {
    responses: Mutex<HashMap<String, CachedResponse>>,
    online: AtomicBool,
    hang: AtomicBool,
    hanging: Mutex<HashSet<String>>,
    calls: AtomicUsize,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(HashMap::new()),
            online: AtomicBool::new(true),
            hang: AtomicBool::new(false),
            hanging: Mutex::new(HashSet::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn respond(&self, url: &str, response: CachedResponse) {
        let key = normalize_url(&url::Url::parse(url).unwrap());
        self.responses.lock().unwrap().insert(key, response);
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    /// Makes every fetch wait forever.
    pub fn set_hang(&self, hang: bool) {
        self.hang.store(hang, Ordering::SeqCst);
    }

    /// Makes fetches of `url` wait forever.
    pub fn hang_on(&self, url: &str) {
        let key = normalize_url(&url::Url::parse(url).unwrap());
        self.hanging.lock().unwrap().insert(key);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(&self, request: &InterceptRequest) -> std::result::Result<CachedResponse, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let hangs = self.hanging.lock().unwrap().contains(&request.cache_key());
        if hangs || self.hang.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if !self.online.load(Ordering::SeqCst) {
            return Err(FetchError::Network("offline".to_string()));
        }

        self.responses
            .lock()
            .unwrap()
            .get(&request.cache_key())
            .cloned()
            .ok_or_else(|| FetchError::Network("connection refused".to_string()))
    }
}

/// Memory storage whose operations can be made to fail on demand.
#[derive(Default)]
pub struct FlakyStorage {
    inner: MemoryCacheStorage,
    fail_open: AtomicBool,
    fail_keys: AtomicBool,
    fail_delete: AtomicBool,
    fail_lookup: AtomicBool,
    lookups: AtomicUsize,
}

impl FlakyStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inner(&self) -> &MemoryCacheStorage {
        &self.inner
    }

    pub fn fail_open(&self, fail: bool) {
        self.fail_open.store(fail, Ordering::SeqCst);
    }

    pub fn fail_keys(&self, fail: bool) {
        self.fail_keys.store(fail, Ordering::SeqCst);
    }

    pub fn fail_delete(&self, fail: bool) {
        self.fail_delete.store(fail, Ordering::SeqCst);
    }

    pub fn fail_lookup(&self, fail: bool) {
        self.fail_lookup.store(fail, Ordering::SeqCst);
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    fn check(flag: &AtomicBool, op: &str) -> Result<()> {
        if flag.load(Ordering::SeqCst) {
            Err(CacheError::Storage(format!("{} unavailable", op)))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl CacheStorage for FlakyStorage {
    async fn open(&self, name: &str) -> Result<()> {
        Self::check(&self.fail_open, "open")?;
        self.inner.open(name).await
    }

    async fn put_all(&self, name: &str, entries: Vec<(String, CachedResponse)>) -> Result<()> {
        self.inner.put_all(name, entries).await
    }

    async fn lookup(&self, name: &str, url: &str) -> Result<Option<CachedResponse>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Self::check(&self.fail_lookup, "lookup")?;
        self.inner.lookup(name, url).await
    }

    async fn keys(&self) -> Result<Vec<String>> {
        Self::check(&self.fail_keys, "keys")?;
        self.inner.keys().await
    }

    async fn delete(&self, name: &str) -> Result<bool> {
        Self::check(&self.fail_delete, "delete")?;
        self.inner.delete(name).await
    }

    async fn entry_count(&self, name: &str) -> Result<usize> {
        self.inner.entry_count(name).await
    }
}
