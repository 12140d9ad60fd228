//! Run configuration assembled from CLI flags and the CI environment.
//!
//! The CI platform is treated as a pure configuration source: workflow
//! identity comes from the standard `GITHUB_*` variables and the admin
//! token from `SOCKET_SENTRY_TOKEN`. Missing identity values are a hard
//! configuration error — there is no placeholder fallback for manual
//! runs.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::{AppError, Result};

/// Environment variable holding the control-plane admin token.
pub const TOKEN_ENV: &str = "SOCKET_SENTRY_TOKEN";

/// Workflow identity extracted from the CI environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CiContext {
    /// `owner/name` repository slug.
    pub repository: String,
    /// Numeric run identifier, unique per workflow run.
    pub run_id: String,
    /// Attempt counter, incremented on re-runs of the same run.
    pub run_attempt: String,
    /// Workflow name as declared in the workflow file.
    pub workflow: String,
    /// Base URL of the CI server, used to build the run URL.
    pub server_url: String,
    /// User who triggered the run.
    pub actor: String,
    /// Job status reported by the platform; defaults to `Success`.
    pub job_status: String,
}

impl CiContext {
    /// Read workflow identity from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Config`] if any required `GITHUB_*` variable
    /// is absent or empty.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            repository: required_env("GITHUB_REPOSITORY")?,
            run_id: required_env("GITHUB_RUN_ID")?,
            run_attempt: required_env("GITHUB_RUN_ATTEMPT")?,
            workflow: required_env("GITHUB_WORKFLOW")?,
            server_url: required_env("GITHUB_SERVER_URL")?,
            actor: required_env("GITHUB_ACTOR")?,
            job_status: env::var("GITHUB_JOB_STATUS").unwrap_or_else(|_| "Success".into()),
        })
    }

    /// URL of the workflow run on the CI server.
    #[must_use]
    pub fn run_url(&self) -> String {
        format!(
            "{}/{}/actions/runs/{}",
            self.server_url, self.repository, self.run_id
        )
    }
}

/// Full configuration for one supervisor invocation.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Control-plane admin/access token.
    pub access_token: String,
    /// Optional chat webhook for the connection notice.
    pub slack_webhook_url: Option<String>,
    /// Detach the connector and return immediately after launch.
    pub background: bool,
    /// Run the teardown path only; no creation or launch.
    pub cleanup_only: bool,
    /// Forced-cleanup window in minutes; 0 means unbounded.
    pub wait_minutes: u64,
    /// Directory holding the run-scoped idempotency markers.
    pub state_dir: PathBuf,
    /// Path to the connector binary.
    pub connector_bin: PathBuf,
    /// Login user the SSH socket is provisioned for.
    pub ssh_username: String,
    /// Workflow identity.
    pub ci: CiContext,
}

impl RunConfig {
    /// Deterministic socket name for this run.
    ///
    /// Derived from repository slug, run id, and run attempt so that
    /// re-runs of the same workflow never collide on a name.
    #[must_use]
    pub fn session_name(&self) -> String {
        session_name(&self.ci.repository, &self.ci.run_id, &self.ci.run_attempt)
    }

    /// Wait budget for the foreground wait; `None` means unbounded.
    #[must_use]
    pub fn wait_budget(&self) -> Option<Duration> {
        (self.wait_minutes > 0).then(|| Duration::from_secs(self.wait_minutes.saturating_mul(60)))
    }

    /// Validate inputs that cannot be checked at parse time.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Config`] if the access token is empty.
    pub fn validate(&self) -> Result<()> {
        if self.access_token.trim().is_empty() {
            return Err(AppError::Config(format!(
                "access token is empty; set {TOKEN_ENV}"
            )));
        }
        Ok(())
    }
}

/// Derive the socket name from repository identity and run counters.
#[must_use]
pub fn session_name(repository: &str, run_id: &str, run_attempt: &str) -> String {
    let repo = repository.replace('/', "-");
    format!("{repo}-{run_id}-{run_attempt}")
}

/// Load the admin token from the environment.
///
/// # Errors
///
/// Returns [`AppError::Config`] if the variable is absent or empty.
pub fn load_access_token() -> Result<String> {
    required_env(TOKEN_ENV)
}

/// Login user of the runner, read from `USER` / `LOGNAME`.
///
/// # Errors
///
/// Returns [`AppError::Config`] if neither variable is set.
pub fn ssh_username() -> Result<String> {
    env::var("USER")
        .or_else(|_| env::var("LOGNAME"))
        .map_err(|_| AppError::Config("cannot determine login user: USER and LOGNAME unset".into()))
}

/// Default directory for the run-scoped idempotency markers.
///
/// Uses the action's own checkout path when provided by the platform,
/// falling back to the OS temp dir.
#[must_use]
pub fn default_state_dir() -> PathBuf {
    env::var_os("GITHUB_ACTION_PATH")
        .map_or_else(env::temp_dir, PathBuf::from)
}

fn required_env(name: &str) -> Result<String> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(AppError::Config(format!(
            "required environment variable {name} is not set"
        ))),
    }
}
