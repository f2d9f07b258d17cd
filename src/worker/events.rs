//! Worker Event Loop
//!
//! Delivers install, activate, register and fetch events to the manager.
//! Each event carries a completion token the handler resolves when done.
//!
//! Lifecycle events run one at a time, in arrival order, on a task of their
//! own. A registration is a single lifecycle event, so no other install can
//! slip between its install and activate steps. Fetch events never queue
//! behind lifecycle work: each runs on its own task against whichever
//! version controls clients at that moment.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{CacheError, Result};
use crate::network::InterceptRequest;
use crate::worker::manager::{
    ActivateReport, FetchOutcome, InstallReport, OfflineCacheManager, WorkerVersion,
};

/// Pending events before senders wait
const EVENT_QUEUE_CAPACITY: usize = 256;

// == Worker Event ==
/// An event dispatched by the host to the worker.
#[derive(Debug)]
pub enum WorkerEvent {
    Install {
        worker: WorkerVersion,
        done: oneshot::Sender<Result<InstallReport>>,
    },
    Activate {
        done: oneshot::Sender<Result<ActivateReport>>,
    },
    /// Install followed, when the version skips waiting, by activate
    Register {
        worker: WorkerVersion,
        done: oneshot::Sender<Result<RegistrationReport>>,
    },
    Fetch {
        request: InterceptRequest,
        respond_with: oneshot::Sender<FetchOutcome>,
    },
}

/// Install and activate reports of one registration.
#[derive(Debug, Clone, Serialize)]
pub struct RegistrationReport {
    pub install: InstallReport,
    pub activate: Option<ActivateReport>,
}

// == Worker Handle ==
/// Cloneable sender side of the event loop.
#[derive(Debug, Clone)]
pub struct WorkerHandle {
    tx: mpsc::Sender<WorkerEvent>,
}

impl WorkerHandle {
    async fn dispatch<T>(&self, event: impl FnOnce(oneshot::Sender<T>) -> WorkerEvent) -> Result<T> {
        let (done, wait) = oneshot::channel();
        self.tx
            .send(event(done))
            .await
            .map_err(|_| CacheError::WorkerUnavailable("event loop stopped".to_string()))?;
        wait.await
            .map_err(|_| CacheError::WorkerUnavailable("completion token dropped".to_string()))
    }

    /// Dispatches an install event and waits for it to finish.
    pub async fn install(&self, worker: WorkerVersion) -> Result<InstallReport> {
        self.dispatch(|done| WorkerEvent::Install { worker, done })
            .await?
    }

    /// Dispatches an activate event and waits for it to finish.
    pub async fn activate(&self) -> Result<ActivateReport> {
        self.dispatch(|done| WorkerEvent::Activate { done }).await?
    }

    /// Dispatches a fetch event and waits for the response decision.
    pub async fn fetch(&self, request: InterceptRequest) -> Result<FetchOutcome> {
        self.dispatch(|respond_with| WorkerEvent::Fetch {
            request,
            respond_with,
        })
        .await
    }

    /// Installs `worker` and, when it asks to skip waiting, activates it.
    ///
    /// Both steps run as one lifecycle event.
    pub async fn register(&self, worker: WorkerVersion) -> Result<RegistrationReport> {
        self.dispatch(|done| WorkerEvent::Register { worker, done })
            .await?
    }
}

// == Event Loop ==
/// Spawns the event loop for `manager`.
///
/// The loop ends once every `WorkerHandle` is dropped. The returned
/// JoinHandle can be used to abort it during shutdown; lifecycle events
/// already queued still run to completion.
pub fn spawn_event_loop(manager: Arc<OfflineCacheManager>) -> (WorkerHandle, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::channel(EVENT_QUEUE_CAPACITY);

    let task = tokio::spawn(async move {
        info!("Worker event loop started");

        // Unbounded so a backlog of lifecycle work never stalls fetch dispatch.
        let (lifecycle_tx, lifecycle_rx) = mpsc::unbounded_channel();
        let lifecycle = tokio::spawn(run_lifecycle(manager.clone(), lifecycle_rx));

        while let Some(event) = rx.recv().await {
            match event {
                WorkerEvent::Fetch {
                    request,
                    respond_with,
                } => spawn_fetch(&manager, request, respond_with),
                event => {
                    if lifecycle_tx.send(event).is_err() {
                        warn!("Lifecycle task stopped, dropping event");
                    }
                }
            }
        }

        drop(lifecycle_tx);
        if let Err(e) = lifecycle.await {
            warn!("Lifecycle task failed: {}", e);
        }
        info!("Worker event loop stopped");
    });

    (WorkerHandle { tx }, task)
}

/// Handles lifecycle events strictly in order.
async fn run_lifecycle(
    manager: Arc<OfflineCacheManager>,
    mut rx: mpsc::UnboundedReceiver<WorkerEvent>,
) {
    while let Some(event) = rx.recv().await {
        match event {
            WorkerEvent::Install { worker, done } => {
                let _ = done.send(manager.install(&worker).await);
            }
            WorkerEvent::Activate { done } => {
                let _ = done.send(manager.activate().await);
            }
            WorkerEvent::Register { worker, done } => {
                let _ = done.send(register(&manager, &worker).await);
            }
            WorkerEvent::Fetch {
                request,
                respond_with,
            } => spawn_fetch(&manager, request, respond_with),
        }
    }
}

async fn register(
    manager: &OfflineCacheManager,
    worker: &WorkerVersion,
) -> Result<RegistrationReport> {
    let install = manager.install(worker).await?;
    let activate = if install.skip_waiting {
        Some(manager.activate().await?)
    } else {
        None
    };
    Ok(RegistrationReport { install, activate })
}

fn spawn_fetch(
    manager: &Arc<OfflineCacheManager>,
    request: InterceptRequest,
    respond_with: oneshot::Sender<FetchOutcome>,
) {
    let manager = manager.clone();
    tokio::spawn(async move {
        let outcome = manager.handle_fetch(&request).await;
        if respond_with.send(outcome).is_err() {
            debug!("Client went away before {} was answered", request.url);
        }
    });
}
