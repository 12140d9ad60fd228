//! Run-scoped idempotency marker store.
//!
//! Plain timestamped files in the run's state directory. Presence alone
//! gates behavior; the content is informational. The existence check is
//! a fast path only — "at most once" is enforced by the cleanup
//! coordinator serializing every mutation, not by this check.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::{AppError, Result};

/// Marker recording that the socket was created in this run.
pub const CREATED_FLAG: &str = "socket-created";

/// Marker recording that cleanup has completed in this run.
pub const CLEANED_UP_FLAG: &str = "cleaned-up";

/// File-backed store for the per-run idempotency markers.
#[derive(Debug, Clone)]
pub struct FlagStore {
    dir: PathBuf,
}

impl FlagStore {
    /// Store markers in `dir`. The directory must already exist.
    #[must_use]
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Directory holding the markers.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Whether the named marker exists.
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.path(name).exists()
    }

    /// Write the named marker with a timestamp note.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Persistence`] if the marker file cannot be
    /// written.
    pub fn set(&self, name: &str) -> Result<()> {
        let path = self.path(name);
        let note = format!("{name} on {}\n", Utc::now().to_rfc3339());
        fs::write(&path, note).map_err(|err| {
            AppError::Persistence(format!("cannot write marker {}: {err}", path.display()))
        })
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("socket-sentry.{name}"))
    }
}
