//! Session model and lifecycle helpers.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::RunConfig;

/// Connector attachment mode for the session.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    /// Connector runs attached; the supervisor waits on it.
    Foreground,
    /// Connector is detached; the supervisor returns after launch.
    Background,
}

/// Lifecycle state for a tunnel session.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Nothing has happened yet.
    Idle,
    /// Remote socket creation is in flight.
    Creating,
    /// Socket exists; connector not yet launched or just launched.
    Created,
    /// Foreground wait is running against the connector.
    ForegroundWaiting,
    /// Connector detached; supervisor has handed control back.
    Backgrounded,
    /// Teardown is in flight.
    CleaningUp,
    /// Terminal state; nothing may follow.
    Terminated,
}

/// One provisioned, named tunnel endpoint tied to a single CI run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Deterministic socket name, unique per run attempt.
    pub name: String,
    /// Attachment mode.
    pub mode: SessionMode,
    /// Forced-cleanup window; `None` means unbounded.
    pub wait_budget: Option<Duration>,
    /// Login user the SSH socket is provisioned for.
    pub ssh_username: String,
    /// Current lifecycle state.
    pub state: SessionState,
}

impl Session {
    /// Construct the session for this run from the assembled config.
    #[must_use]
    pub fn from_config(config: &RunConfig) -> Self {
        let mode = if config.background {
            SessionMode::Background
        } else {
            SessionMode::Foreground
        };
        Self {
            name: config.session_name(),
            mode,
            wait_budget: config.wait_budget(),
            ssh_username: config.ssh_username.clone(),
            state: SessionState::Idle,
        }
    }

    /// Determine whether a lifecycle transition is permitted.
    ///
    /// `Creating` may be skipped entirely when the creation marker from
    /// an earlier supervisor invocation already exists, and `CleaningUp`
    /// is reachable from every non-terminal state because any of the
    /// trigger paths may fire first.
    #[must_use]
    pub fn can_transition_to(&self, next: SessionState) -> bool {
        matches!(
            (self.state, next),
            (SessionState::Idle, SessionState::Creating | SessionState::Created)
                | (SessionState::Creating, SessionState::Created)
                | (
                    SessionState::Created,
                    SessionState::ForegroundWaiting | SessionState::Backgrounded
                )
                | (
                    SessionState::Idle
                        | SessionState::Created
                        | SessionState::ForegroundWaiting
                        | SessionState::Backgrounded,
                    SessionState::CleaningUp
                )
                | (SessionState::CleaningUp, SessionState::Terminated)
        )
    }

    /// Apply a transition, logging and ignoring invalid ones.
    pub fn advance(&mut self, next: SessionState) {
        if self.can_transition_to(next) {
            tracing::debug!(session = %self.name, from = ?self.state, to = ?next, "session transition");
            self.state = next;
        } else {
            tracing::warn!(
                session = %self.name,
                from = ?self.state,
                to = ?next,
                "invalid session transition ignored"
            );
        }
    }
}
