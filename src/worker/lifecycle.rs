//! Worker Lifecycle Module
//!
//! Explicit state machine for cache versions. An incoming version moves
//! through `Installing -> Installed -> Activating` and then becomes the
//! active version, replacing the previous one.

use serde::Serialize;

use crate::error::{CacheError, Result};

// == Phase ==
/// Phase of a version that has not yet taken over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Installing,
    /// Installed and waiting to activate
    Installed,
    Activating,
}

// == Pending Version ==
/// A version in flight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingVersion {
    pub version: String,
    pub phase: Phase,
}

// == Lifecycle ==
/// Tracks the active version and at most one incoming version.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Lifecycle {
    /// Version currently serving requests
    active: Option<String>,
    /// Version being installed or activated
    pending: Option<PendingVersion>,
    /// Whether open clients route through the active version
    clients_claimed: bool,
}

impl Lifecycle {
    /// Creates a lifecycle with nothing installed.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_version(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn pending(&self) -> Option<&PendingVersion> {
        self.pending.as_ref()
    }

    pub fn clients_claimed(&self) -> bool {
        self.clients_claimed
    }

    /// Version requests are routed through, if any.
    ///
    /// A version intercepts only after it is active and has claimed clients.
    pub fn controller(&self) -> Option<&str> {
        if self.clients_claimed {
            self.active.as_deref()
        } else {
            None
        }
    }

    // == Install ==
    /// Starts installing `version`.
    ///
    /// A version waiting in `Installed` is superseded. Installing the already
    /// active version, or starting while another install or activation is
    /// running, is rejected.
    pub fn begin_install(&mut self, version: &str) -> Result<()> {
        if let Some(pending) = &self.pending {
            if pending.phase != Phase::Installed {
                return Err(CacheError::InvalidTransition(format!(
                    "version {} is {:?}",
                    pending.version, pending.phase
                )));
            }
        }
        if self.active.as_deref() == Some(version) {
            return Err(CacheError::InvalidTransition(format!(
                "version {} is already active",
                version
            )));
        }

        self.pending = Some(PendingVersion {
            version: version.to_string(),
            phase: Phase::Installing,
        });
        Ok(())
    }

    /// Marks the installing version as installed.
    pub fn finish_install(&mut self) -> Result<String> {
        self.advance(Phase::Installing, Phase::Installed)
    }

    // == Activate ==
    /// Starts activating the installed version.
    pub fn begin_activate(&mut self) -> Result<String> {
        self.advance(Phase::Installed, Phase::Activating)
    }

    /// Promotes the activating version to active.
    ///
    /// Clients stay with no controller until `claim_clients` runs.
    pub fn finish_activate(&mut self) -> Result<String> {
        match self.pending.take() {
            Some(pending) if pending.phase == Phase::Activating => {
                self.active = Some(pending.version.clone());
                self.clients_claimed = false;
                Ok(pending.version)
            }
            other => {
                let error = transition_error(other.as_ref(), Phase::Activating);
                self.pending = other;
                Err(error)
            }
        }
    }

    /// Routes every open client through the active version.
    pub fn claim_clients(&mut self) {
        self.clients_claimed = self.active.is_some();
    }

    fn advance(&mut self, from: Phase, to: Phase) -> Result<String> {
        match self.pending.as_mut() {
            Some(pending) if pending.phase == from => {
                pending.phase = to;
                Ok(pending.version.clone())
            }
            other => Err(transition_error(other.as_deref(), from)),
        }
    }
}

fn transition_error(pending: Option<&PendingVersion>, expected: Phase) -> CacheError {
    match pending {
        Some(p) => CacheError::InvalidTransition(format!(
            "expected {:?}, version {} is {:?}",
            expected, p.version, p.phase
        )),
        None => CacheError::InvalidTransition(format!(
            "expected {:?}, no version pending",
            expected
        )),
    }
}
