//! Cache Storage Module
//!
//! The set of named cache stores shared by every client context.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::cache::{CacheStore, CachedResponse};
use crate::error::{CacheError, Result};

// == Cache Storage Trait ==
/// Named-store storage backend.
///
/// Implementations serialize concurrent reads and writes themselves; callers
/// add no locking of their own. Every operation may fail transiently.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Opens the store named `name`, creating it if absent.
    async fn open(&self, name: &str) -> Result<()>;

    /// Inserts every entry into the store `name` as a single batch.
    async fn put_all(&self, name: &str, entries: Vec<(String, CachedResponse)>) -> Result<()>;

    /// Looks up `url` in the store `name`.
    async fn lookup(&self, name: &str, url: &str) -> Result<Option<CachedResponse>>;

    /// Lists every store name.
    async fn keys(&self) -> Result<Vec<String>>;

    /// Deletes the store `name`, returning whether it existed.
    async fn delete(&self, name: &str) -> Result<bool>;

    /// Returns the number of entries in the store `name`.
    async fn entry_count(&self, name: &str) -> Result<usize>;
}

// == Memory Cache Storage ==
/// In-process storage backed by a HashMap of stores.
#[derive(Debug, Default)]
pub struct MemoryCacheStorage {
    stores: RwLock<HashMap<String, CacheStore>>,
}

impl MemoryCacheStorage {
    /// Creates an empty storage.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStorage for MemoryCacheStorage {
    async fn open(&self, name: &str) -> Result<()> {
        let mut stores = self.stores.write().await;
        stores
            .entry(name.to_string())
            .or_insert_with(CacheStore::new);
        Ok(())
    }

    async fn put_all(&self, name: &str, entries: Vec<(String, CachedResponse)>) -> Result<()> {
        let mut stores = self.stores.write().await;
        let store = stores
            .get_mut(name)
            .ok_or_else(|| CacheError::StoreNotFound(name.to_string()))?;

        for (url, response) in entries {
            store.put(url, response);
        }
        Ok(())
    }

    async fn lookup(&self, name: &str, url: &str) -> Result<Option<CachedResponse>> {
        let stores = self.stores.read().await;
        Ok(stores
            .get(name)
            .and_then(|store| store.match_url(url))
            .cloned())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let stores = self.stores.read().await;
        let mut names: Vec<String> = stores.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn delete(&self, name: &str) -> Result<bool> {
        let mut stores = self.stores.write().await;
        Ok(stores.remove(name).is_some())
    }

    async fn entry_count(&self, name: &str) -> Result<usize> {
        let stores = self.stores.read().await;
        Ok(stores.get(name).map(CacheStore::len).unwrap_or(0))
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_creates_store_once() {
        let storage = MemoryCacheStorage::new();

        storage.open("v1").await.unwrap();
        storage
            .put_all("v1", vec![("http://a/".into(), CachedResponse::new(200, "a"))])
            .await
            .unwrap();
        storage.open("v1").await.unwrap();

        assert_eq!(storage.keys().await.unwrap(), vec!["v1"]);
        assert_eq!(storage.entry_count("v1").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_put_all_requires_open_store() {
        let storage = MemoryCacheStorage::new();

        let result = storage.put_all("missing", Vec::new()).await;
        assert!(matches!(result, Err(CacheError::StoreNotFound(_))));
    }

    #[tokio::test]
    async fn test_lookup_is_scoped_to_store() {
        let storage = MemoryCacheStorage::new();
        storage.open("v1").await.unwrap();
        storage.open("v2").await.unwrap();
        storage
            .put_all("v1", vec![("http://a/".into(), CachedResponse::new(200, "a"))])
            .await
            .unwrap();

        assert!(storage.lookup("v1", "http://a/").await.unwrap().is_some());
        assert!(storage.lookup("v2", "http://a/").await.unwrap().is_none());
        assert!(storage.lookup("v3", "http://a/").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete() {
        let storage = MemoryCacheStorage::new();
        storage.open("old").await.unwrap();

        assert!(storage.delete("old").await.unwrap());
        assert!(!storage.delete("old").await.unwrap());
        assert!(storage.keys().await.unwrap().is_empty());
    }
}
