//! Offline Cache - a network-first caching proxy
//!
//! Serves live responses when the upstream is reachable and falls back to a
//! versioned cache store, then to a synthetic offline response, when it is not.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use offline_cache::api::create_router;
use offline_cache::worker::BestEffort;
use offline_cache::{spawn_event_loop, AppState, Config, OfflineCacheManager, WorkerVersion};

/// Main entry point for the offline cache proxy.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create the cache manager and start its event loop
/// 4. Install and activate the configured cache version
/// 5. Create Axum router with the admin endpoints and proxy fallback
/// 6. Start HTTP server on configured port
/// 7. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber with env filter
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "offline_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Offline Cache Proxy");

    let config = Config::from_env();
    info!(
        "Configuration loaded: upstream={}, version={}, essential={:?}, port={}, fetch_timeout={:?}",
        config.upstream_url,
        config.cache_version,
        config.essential_resources,
        config.server_port,
        config.fetch_timeout()
    );

    let manager = Arc::new(
        OfflineCacheManager::from_config(&config).context("Failed to build cache manager")?,
    );
    let (worker, event_loop) = spawn_event_loop(manager.clone());
    info!("Worker event loop started");

    // A degraded install or cleanup still leaves the proxy serving.
    let report = worker
        .register(WorkerVersion::from_config(&config))
        .await
        .context("Failed to register cache version")?;
    if let BestEffort::Degraded { reason } = &report.install.outcome {
        warn!("Essential resources not cached: {}", reason);
    }
    if let Some(BestEffort::Degraded { reason }) = report.activate.as_ref().map(|a| &a.outcome) {
        warn!("Old cache cleanup incomplete: {}", reason);
    }

    let app = create_router(AppState::new(
        manager,
        worker,
        config.essential_resources.clone(),
    ));

    // Bind to configured port
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Proxy listening on http://{}", addr);

    // Start server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(event_loop))
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, aborts the worker event loop and allows graceful shutdown.
async fn shutdown_signal(event_loop: tokio::task::JoinHandle<()>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    // Abort the worker event loop
    event_loop.abort();
    warn!("Worker event loop aborted");
}
