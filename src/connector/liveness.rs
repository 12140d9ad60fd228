//! Point-in-time connector liveness probe.
//!
//! A purely stateless query: is a process matching the connector's
//! invocation pattern currently running? Used before launch (to avoid a
//! double launch), periodically during a bounded foreground wait, and as
//! a one-shot check to tell "still alive" from "already exited".

use std::future::Future;
use std::pin::Pin;
use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

/// Probe for a running process matching a fixed pattern.
pub trait Liveness: Send + Sync {
    /// Whether a matching process is running right now.
    fn is_running(&self) -> Pin<Box<dyn Future<Output = bool> + Send + '_>>;
}

/// `pgrep -f` based probe matching the connector's full command line.
#[derive(Debug, Clone)]
pub struct PgrepProbe {
    pattern: String,
}

impl PgrepProbe {
    /// Probe for processes whose command line contains `pattern`.
    #[must_use]
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
        }
    }

    /// The pattern this probe matches against.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

impl Liveness for PgrepProbe {
    fn is_running(&self) -> Pin<Box<dyn Future<Output = bool> + Send + '_>> {
        Box::pin(async move {
            let status = Command::new("pgrep")
                .arg("-f")
                .arg(&self.pattern)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .await;
            let running = status.is_ok_and(|s| s.success());
            debug!(pattern = %self.pattern, running, "liveness probe");
            running
        })
    }
}
