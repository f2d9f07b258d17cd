//! Offline Cache Manager
//!
//! Installs and activates cache versions and answers intercepted requests
//! network-first, cache-fallback, synthetic-last.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use url::Url;

use crate::cache::{CacheStorage, CachedResponse, InterceptStats, MemoryCacheStorage};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::network::{resolve, FetchError, Fetcher, HttpFetcher, InterceptRequest};
use crate::worker::lifecycle::{Lifecycle, PendingVersion};

// == Worker Version ==
/// A cache version and the resources it seeds on install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerVersion {
    /// Label naming the version's cache store
    pub version: String,
    /// Paths or URLs seeded on install, resolved against the upstream
    pub essential_resources: Vec<String>,
}

impl WorkerVersion {
    pub fn new(version: impl Into<String>, essential_resources: Vec<String>) -> Self {
        Self {
            version: version.into(),
            essential_resources,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.cache_version.clone(),
            config.essential_resources.clone(),
        )
    }
}

// == Best Effort ==
/// Outcome of a step whose failures are recovered locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum BestEffort {
    /// Every sub-step succeeded
    Completed,
    /// Some sub-step failed; the transition still completed
    Degraded { reason: String },
}

impl BestEffort {
    pub fn degraded(reason: impl Into<String>) -> Self {
        BestEffort::Degraded {
            reason: reason.into(),
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, BestEffort::Completed)
    }
}

// == Reports ==
/// Result of an install transition.
#[derive(Debug, Clone, Serialize)]
pub struct InstallReport {
    pub version: String,
    /// Essential resources stored
    pub seeded: usize,
    pub outcome: BestEffort,
    /// Activate immediately rather than wait for old clients to go away
    pub skip_waiting: bool,
}

/// Result of an activate transition.
#[derive(Debug, Clone, Serialize)]
pub struct ActivateReport {
    pub version: String,
    /// Stale stores removed
    pub deleted: Vec<String>,
    pub outcome: BestEffort,
    pub clients_claimed: bool,
}

/// Point-in-time view of the lifecycle.
#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    pub active_version: Option<String>,
    pub pending: Option<PendingVersion>,
    pub clients_claimed: bool,
    pub stores: Vec<String>,
}

// == Fetch Outcome ==
/// How an intercepted request was answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Live response, any status, unmodified
    Network(CachedResponse),
    /// Stored response served after a network failure
    Cache(CachedResponse),
    /// Synthetic 503 served after a network failure and cache miss
    Offline(CachedResponse),
    /// Not intercepted; default handling applies
    PassThrough,
}

impl FetchOutcome {
    /// The response to serve, or None for pass-through.
    pub fn served(self) -> Option<CachedResponse> {
        match self {
            FetchOutcome::Network(r) | FetchOutcome::Cache(r) | FetchOutcome::Offline(r) => Some(r),
            FetchOutcome::PassThrough => None,
        }
    }

    pub fn source(&self) -> &'static str {
        match self {
            FetchOutcome::Network(_) => "network",
            FetchOutcome::Cache(_) => "cache",
            FetchOutcome::Offline(_) => "offline",
            FetchOutcome::PassThrough => "passthrough",
        }
    }
}

// == Offline Cache Manager ==
/// Owns the storage handle, the fetcher and the lifecycle state.
pub struct OfflineCacheManager {
    storage: Arc<dyn CacheStorage>,
    fetcher: Arc<dyn Fetcher>,
    /// Origin essential resources are resolved against
    base_url: Url,
    /// None waits on the network indefinitely
    fetch_timeout: Option<Duration>,
    lifecycle: RwLock<Lifecycle>,
    stats: RwLock<InterceptStats>,
}

impl OfflineCacheManager {
    // == Constructor ==
    pub fn new(storage: Arc<dyn CacheStorage>, fetcher: Arc<dyn Fetcher>, base_url: Url) -> Self {
        Self {
            storage,
            fetcher,
            base_url,
            fetch_timeout: None,
            lifecycle: RwLock::new(Lifecycle::new()),
            stats: RwLock::new(InterceptStats::new()),
        }
    }

    /// Bounds each live network attempt.
    pub fn with_fetch_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Builds a manager with in-memory storage and an HTTP fetcher.
    pub fn from_config(config: &Config) -> Result<Self> {
        let base_url = Url::parse(&config.upstream_url)
            .map_err(|e| CacheError::InvalidUrl(format!("{}: {}", config.upstream_url, e)))?;

        Ok(Self::new(
            Arc::new(MemoryCacheStorage::new()),
            Arc::new(HttpFetcher::new()?),
            base_url,
        )
        .with_fetch_timeout(config.fetch_timeout()))
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // == Install ==
    /// Opens the version's store and seeds the essential resources.
    ///
    /// Storage and network failures degrade the report but never fail the
    /// transition. Only an out-of-order transition is an error.
    pub async fn install(&self, worker: &WorkerVersion) -> Result<InstallReport> {
        self.lifecycle.write().await.begin_install(&worker.version)?;
        info!("Installing cache version {}", worker.version);

        let (seeded, outcome) = match self.storage.open(&worker.version).await {
            Ok(()) => self.seed(&worker.version, &worker.essential_resources).await,
            Err(e) => {
                warn!("Cache setup failed for {}: {}", worker.version, e);
                (0, BestEffort::degraded(e.to_string()))
            }
        };

        self.lifecycle.write().await.finish_install()?;
        info!(
            "Installed cache version {} ({} essential resources cached)",
            worker.version, seeded
        );

        Ok(InstallReport {
            version: worker.version.clone(),
            seeded,
            outcome,
            skip_waiting: true,
        })
    }

    /// Fetches every essential resource and stores them as one batch.
    ///
    /// A transport failure or non-2xx status on any resource stores nothing.
    async fn seed(&self, name: &str, resources: &[String]) -> (usize, BestEffort) {
        let degrade = |reason: String| {
            warn!("Failed to cache essential resources for {}: {}", name, reason);
            (0, BestEffort::degraded(reason))
        };

        let mut entries = Vec::with_capacity(resources.len());
        for path in resources {
            let request = match resolve(&self.base_url, path) {
                Ok(url) => InterceptRequest::get(url),
                Err(e) => return degrade(e.to_string()),
            };
            match self.fetch_live(&request).await {
                Ok(response) if response.is_ok() => entries.push((request.cache_key(), response)),
                Ok(response) => {
                    return degrade(format!("{} returned status {}", path, response.status))
                }
                Err(e) => return degrade(format!("{}: {}", path, e)),
            }
        }

        let count = entries.len();
        match self.storage.put_all(name, entries).await {
            Ok(()) => {
                debug!("Cached {} essential resources into {}", count, name);
                (count, BestEffort::Completed)
            }
            Err(e) => degrade(e.to_string()),
        }
    }

    // == Activate ==
    /// Deletes every store but the installed version's, then claims clients.
    pub async fn activate(&self) -> Result<ActivateReport> {
        let version = self.lifecycle.write().await.begin_activate()?;
        info!("Activating cache version {}", version);

        let (deleted, outcome) = self.cleanup_stale(&version).await;

        {
            let mut lifecycle = self.lifecycle.write().await;
            lifecycle.finish_activate()?;
            lifecycle.claim_clients();
        }
        info!("Cache version {} active, clients claimed", version);

        Ok(ActivateReport {
            version,
            deleted,
            outcome,
            clients_claimed: true,
        })
    }

    async fn cleanup_stale(&self, current: &str) -> (Vec<String>, BestEffort) {
        let names = match self.storage.keys().await {
            Ok(names) => names,
            Err(e) => {
                warn!("Cache cleanup failed: {}", e);
                return (Vec::new(), BestEffort::degraded(e.to_string()));
            }
        };

        let mut deleted = Vec::new();
        let mut failures = Vec::new();
        for name in names.into_iter().filter(|n| n != current) {
            info!("Deleting old cache: {}", name);
            match self.storage.delete(&name).await {
                Ok(_) => deleted.push(name),
                Err(e) => {
                    warn!("Failed to delete old cache {}: {}", name, e);
                    failures.push(format!("{}: {}", name, e));
                }
            }
        }

        let outcome = if failures.is_empty() {
            BestEffort::Completed
        } else {
            BestEffort::degraded(failures.join("; "))
        };
        (deleted, outcome)
    }

    // == Fetch ==
    /// Answers an intercepted request.
    ///
    /// Ineligible requests, and any request before a version controls
    /// clients, pass through untouched. Otherwise the live response is
    /// returned as-is whatever its status; only a transport failure falls
    /// back to the active store and then to the synthetic offline response.
    pub async fn handle_fetch(&self, request: &InterceptRequest) -> FetchOutcome {
        if !request.is_eligible() {
            debug!("Passing through {} {}", request.method, request.url);
            self.stats.write().await.record_passthrough();
            return FetchOutcome::PassThrough;
        }

        let controller = self.lifecycle.read().await.controller().map(String::from);
        let Some(version) = controller else {
            debug!("No active cache version, passing through {}", request.url);
            self.stats.write().await.record_passthrough();
            return FetchOutcome::PassThrough;
        };

        let error = match self.fetch_live(request).await {
            Ok(response) => {
                self.stats.write().await.record_network();
                return FetchOutcome::Network(response);
            }
            Err(e) => e,
        };
        debug!("Network failed for {}: {}", request.url, error);

        match self.storage.lookup(&version, &request.cache_key()).await {
            Ok(Some(response)) => {
                info!("Serving from cache: {}", request.url);
                self.stats.write().await.record_cache_hit();
                FetchOutcome::Cache(response)
            }
            Ok(None) => {
                debug!("No cached copy of {}, serving offline response", request.url);
                self.stats.write().await.record_offline();
                FetchOutcome::Offline(CachedResponse::offline())
            }
            Err(e) => {
                warn!("Cache lookup failed for {}: {}", request.url, e);
                self.stats.write().await.record_offline();
                FetchOutcome::Offline(CachedResponse::offline())
            }
        }
    }

    /// Default handling for requests that are not intercepted.
    pub async fn pass_through(&self, request: &InterceptRequest) -> Result<CachedResponse> {
        self.fetcher
            .fetch(request)
            .await
            .map_err(|e| CacheError::Upstream(e.to_string()))
    }

    async fn fetch_live(&self, request: &InterceptRequest) -> std::result::Result<CachedResponse, FetchError> {
        match self.fetch_timeout {
            Some(limit) => tokio::time::timeout(limit, self.fetcher.fetch(request))
                .await
                .unwrap_or_else(|_| Err(FetchError::Timeout(limit.as_millis() as u64))),
            None => self.fetcher.fetch(request).await,
        }
    }

    // == Introspection ==
    pub async fn status(&self) -> StatusSnapshot {
        let stores = match self.storage.keys().await {
            Ok(names) => names,
            Err(e) => {
                warn!("Failed to list cache stores: {}", e);
                Vec::new()
            }
        };

        let lifecycle = self.lifecycle.read().await;
        StatusSnapshot {
            active_version: lifecycle.active_version().map(String::from),
            pending: lifecycle.pending().cloned(),
            clients_claimed: lifecycle.clients_claimed(),
            stores,
        }
    }

    pub async fn stats(&self) -> InterceptStats {
        self.stats.read().await.clone()
    }

    /// Entries in the active store, 0 when nothing is active.
    pub async fn active_entry_count(&self) -> usize {
        let active = self.lifecycle.read().await.active_version().map(String::from);
        match active {
            Some(version) => self.storage.entry_count(&version).await.unwrap_or_else(|e| {
                warn!("Failed to count entries in {}: {}", version, e);
                0
            }),
            None => 0,
        }
    }
}
