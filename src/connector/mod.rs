//! Connector binary abstraction.
//!
//! The [`ConnectorCli`] trait narrows the external binary to the three
//! subcommands the supervisor drives (`socket create`, `socket connect`,
//! `socket delete`) so the lifecycle core is testable against a fake
//! implementation without invoking a real process.

pub mod launcher;
pub mod liveness;

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::process::Stdio;

use tokio::process::{Child, Command};
use tracing::info;

use crate::models::session::SessionMode;
use crate::{AppError, Result};

/// Default location of the connector binary on the runner.
pub const DEFAULT_CONNECTOR_BIN: &str = "./border0";

/// Environment variable the connector reads its admin token from.
pub const TOKEN_VAR: &str = "BORDER0_ADMIN_TOKEN";

/// Process pattern identifying a live connector, for the liveness probe.
#[must_use]
pub fn connect_pattern(bin: &Path) -> String {
    format!("{} socket connect", bin.display())
}

/// Narrow interface over the connector binary's subcommands.
pub trait ConnectorCli: Send + Sync {
    /// Create the named SSH socket.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Launch`](crate::AppError::Launch) if the binary cannot be started, or
    /// [`AppError::Api`](crate::AppError::Api) if the subcommand exits non-zero.
    fn create_session(
        &self,
        name: &str,
        username: &str,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;

    /// Start the long-lived connector process for the named socket.
    ///
    /// In [`SessionMode::Background`] the child is detached into its own
    /// process group and outlives the supervisor; in foreground mode it
    /// is killed when the handle is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Launch`](crate::AppError::Launch) if the process cannot be spawned.
    fn spawn_connector(
        &self,
        name: &str,
        username: &str,
        mode: SessionMode,
    ) -> Pin<Box<dyn Future<Output = Result<Child>> + Send + '_>>;

    /// Delete the named socket.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Launch`](crate::AppError::Launch) if the binary cannot be started, or
    /// [`AppError::Api`](crate::AppError::Api) if the subcommand exits non-zero.
    fn delete_session(&self, name: &str) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Production implementation shelling out to the connector binary.
#[derive(Debug, Clone)]
pub struct ShellConnector {
    bin: PathBuf,
    token: String,
}

impl ShellConnector {
    /// Wrap the connector binary at `bin`, authenticating with `token`.
    #[must_use]
    pub fn new(bin: PathBuf, token: impl Into<String>) -> Self {
        Self {
            bin,
            token: token.into(),
        }
    }

    /// Path of the wrapped binary.
    #[must_use]
    pub fn bin(&self) -> &Path {
        &self.bin
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.bin);
        cmd.env(TOKEN_VAR, &self.token);
        cmd
    }

    async fn run_subcommand(&self, args: &[&str]) -> Result<()> {
        let status = self
            .command()
            .args(args)
            .status()
            .await
            .map_err(|err| AppError::Launch(format!("failed to run {}: {err}", self.bin.display())))?;
        if status.success() {
            Ok(())
        } else {
            Err(AppError::Api(format!(
                "{} {} exited with {status}",
                self.bin.display(),
                args.join(" ")
            )))
        }
    }
}

impl ConnectorCli for ShellConnector {
    fn create_session(
        &self,
        name: &str,
        username: &str,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let name = name.to_owned();
        let username = username.to_owned();
        Box::pin(async move {
            self.run_subcommand(&[
                "socket",
                "create",
                "--type",
                "ssh",
                "--name",
                &name,
                "--upstream_username",
                &username,
            ])
            .await?;
            info!(socket = %name, "socket created");
            Ok(())
        })
    }

    fn spawn_connector(
        &self,
        name: &str,
        username: &str,
        mode: SessionMode,
    ) -> Pin<Box<dyn Future<Output = Result<Child>> + Send + '_>> {
        let name = name.to_owned();
        let username = username.to_owned();
        Box::pin(async move {
            let mut cmd = self.command();
            cmd.args([
                "socket",
                "connect",
                &name,
                "--sshserver",
                "--upstream_username",
                &username,
            ])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

            match mode {
                SessionMode::Foreground => {
                    cmd.kill_on_drop(true);
                }
                SessionMode::Background => {
                    // Detach so the connector survives supervisor exit.
                    #[cfg(unix)]
                    cmd.process_group(0);
                }
            }

            let child = cmd.spawn().map_err(|err| {
                AppError::Launch(format!(
                    "failed to spawn connector {}: {err}",
                    self.bin.display()
                ))
            })?;
            info!(socket = %name, pid = child.id().unwrap_or(0), mode = ?mode, "connector started");
            Ok(child)
        })
    }

    fn delete_session(&self, name: &str) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let name = name.to_owned();
        Box::pin(async move {
            self.run_subcommand(&["socket", "delete", &name]).await?;
            info!(socket = %name, "socket deleted");
            Ok(())
        })
    }
}
