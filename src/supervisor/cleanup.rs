//! Idempotent teardown coordinator.
//!
//! Every trigger path (deadline, connector exit, liveness loss, OS
//! signal, explicit cleanup run) funnels through [`CleanupCoordinator::run`].
//! The routine never returns an error: it frequently executes on signal
//! and teardown paths where an unhandled failure would abort before the
//! process can exit cleanly.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::connector::ConnectorCli;
use crate::supervisor::flags::{FlagStore, CLEANED_UP_FLAG};
use crate::supervisor::CleanupTrigger;

/// Result of a cleanup invocation, for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupOutcome {
    /// This invocation performed the remote delete and wrote the marker.
    Performed,
    /// A prior invocation already completed cleanup; nothing was done.
    AlreadyDone,
}

/// Single serialization point for the "cleanup at most once" invariant.
pub struct CleanupCoordinator {
    connector: Arc<dyn ConnectorCli>,
    flags: FlagStore,
    // Serializes concurrent triggers; the marker check alone is racy.
    guard: Mutex<()>,
}

impl CleanupCoordinator {
    /// Build a coordinator deleting through `connector` and recording in
    /// `flags`.
    #[must_use]
    pub fn new(connector: Arc<dyn ConnectorCli>, flags: FlagStore) -> Self {
        Self {
            connector,
            flags,
            guard: Mutex::new(()),
        }
    }

    /// The marker store backing this coordinator.
    #[must_use]
    pub fn flags(&self) -> &FlagStore {
        &self.flags
    }

    /// Tear down the session: delete the remote socket and write the
    /// cleaned-up marker.
    ///
    /// Safe to invoke concurrently from any trigger path. A failed
    /// remote delete is logged once and abandoned; the marker is still
    /// written so a later trigger does not re-attempt it. A failed
    /// marker write is also only logged, accepting the risk of a
    /// duplicate delete on the next invocation.
    pub async fn run(&self, session_name: &str, trigger: &CleanupTrigger) -> CleanupOutcome {
        let _lock = self.guard.lock().await;

        if self.flags.has(CLEANED_UP_FLAG) {
            info!(session = %session_name, %trigger, "cleanup already ran; skipping");
            return CleanupOutcome::AlreadyDone;
        }

        info!(session = %session_name, %trigger, "running cleanup");
        match self.connector.delete_session(session_name).await {
            Ok(()) => info!(session = %session_name, "socket deleted"),
            Err(err) => error!(session = %session_name, %err, "failed to delete socket"),
        }

        if let Err(err) = self.flags.set(CLEANED_UP_FLAG) {
            warn!(session = %session_name, %err, "failed to write cleaned-up marker");
        }

        CleanupOutcome::Performed
    }
}
