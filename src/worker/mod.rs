//! Worker Module
//!
//! The offline cache manager, its lifecycle state machine and the event
//! loop that feeds it.

mod events;
mod lifecycle;
mod manager;

#[cfg(test)]
pub(crate) mod testing;

pub use events::{spawn_event_loop, RegistrationReport, WorkerEvent, WorkerHandle};
pub use lifecycle::{Lifecycle, PendingVersion, Phase};
pub use manager::{
    ActivateReport, BestEffort, FetchOutcome, InstallReport, OfflineCacheManager, StatusSnapshot,
    WorkerVersion,
};
