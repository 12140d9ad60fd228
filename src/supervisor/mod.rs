//! Session lifecycle supervisor.
//!
//! Creates the socket exactly once per run, launches and monitors the
//! connector process, and coordinates an idempotent cleanup across the
//! independent trigger paths: wait deadline, connector exit, liveness
//! loss, OS signal, and explicit cleanup invocation.

pub mod cleanup;
pub mod flags;
pub mod signal;
pub mod wait;

use std::fmt::{Display, Formatter};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::api::{merge_workflow_tags, org_from_dns_name, ControlPlaneClient, SocketInfo};
use crate::config::RunConfig;
use crate::connector::liveness::{Liveness, PgrepProbe};
use crate::connector::{connect_pattern, launcher, ConnectorCli, ShellConnector};
use crate::models::session::{Session, SessionMode, SessionState};
use crate::slack::webhook::WebhookNotifier;
use crate::slack::{message_blocks, print_summary, ConnectionNotice};
use crate::supervisor::cleanup::CleanupCoordinator;
use crate::supervisor::flags::{FlagStore, CREATED_FLAG};
use crate::Result;

/// The event that won the race and caused cleanup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupTrigger {
    /// The wait budget elapsed before the connector exited.
    Deadline,
    /// The connector process exited on its own, with this exit code.
    ConnectorExit(Option<i32>),
    /// The periodic liveness probe no longer found the connector.
    LivenessLost,
    /// An interrupt or termination signal arrived.
    Signal,
    /// Cleanup was requested explicitly (cleanup-only invocation).
    Explicit,
}

impl Display for CleanupTrigger {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Deadline => write!(f, "time limit reached"),
            Self::ConnectorExit(Some(code)) => {
                write!(f, "connector exited with code {code}")
            }
            Self::ConnectorExit(None) => write!(f, "connector exited"),
            Self::LivenessLost => write!(f, "connector process no longer running"),
            Self::Signal => write!(f, "interrupt signal received"),
            Self::Explicit => write!(f, "cleanup requested"),
        }
    }
}

/// Drives one session from creation through guaranteed teardown.
pub struct Supervisor {
    config: RunConfig,
    session: Session,
    connector: Arc<dyn ConnectorCli>,
    probe: Arc<dyn Liveness>,
    api: ControlPlaneClient,
    cleanup: Arc<CleanupCoordinator>,
    shutdown: CancellationToken,
}

impl Supervisor {
    /// Production wiring: shell connector, pgrep probe, real control
    /// plane, markers in the configured state directory.
    #[must_use]
    pub fn new(config: RunConfig) -> Self {
        let connector: Arc<dyn ConnectorCli> = Arc::new(ShellConnector::new(
            config.connector_bin.clone(),
            config.access_token.clone(),
        ));
        let probe: Arc<dyn Liveness> =
            Arc::new(PgrepProbe::new(connect_pattern(&config.connector_bin)));
        let api = ControlPlaneClient::new(config.access_token.clone());
        let flags = FlagStore::new(config.state_dir.clone());
        Self::with_parts(config, connector, probe, api, flags)
    }

    /// Wiring with injected collaborators, used by tests.
    #[must_use]
    pub fn with_parts(
        config: RunConfig,
        connector: Arc<dyn ConnectorCli>,
        probe: Arc<dyn Liveness>,
        api: ControlPlaneClient,
        flags: FlagStore,
    ) -> Self {
        let session = Session::from_config(&config);
        let cleanup = Arc::new(CleanupCoordinator::new(Arc::clone(&connector), flags));
        Self {
            config,
            session,
            connector,
            probe,
            api,
            cleanup,
            shutdown: CancellationToken::new(),
        }
    }

    /// Token cancelled by the signal bridge; exposed for tests.
    #[must_use]
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Run the session to completion.
    ///
    /// Returns `Ok(())` on every voluntary cleanup path so the process
    /// exits zero; only configuration, creation, and launch failures
    /// propagate.
    ///
    /// # Errors
    ///
    /// Returns [`AppError`](crate::AppError) variants for invalid
    /// configuration, failed socket creation, failed metadata fetch, or
    /// a connector that cannot be spawned.
    pub async fn run(mut self) -> Result<()> {
        self.config.validate()?;
        let name = self.session.name.clone();

        if self.config.cleanup_only {
            info!(session = %name, "cleanup-only invocation");
            self.session.advance(SessionState::CleaningUp);
            self.cleanup.run(&name, &CleanupTrigger::Explicit).await;
            self.session.advance(SessionState::Terminated);
            return Ok(());
        }

        self.create_session_if_needed().await?;

        let signal_task = signal::arm(self.shutdown.clone());
        let mut child = launcher::launch(&*self.connector, &*self.probe, &self.session).await?;

        if self.session.mode == SessionMode::Background {
            self.session.advance(SessionState::Backgrounded);
            if let Some(mut detached) = child.take() {
                // Best-effort: only observes the exit while this process
                // is still alive.
                let coordinator = Arc::clone(&self.cleanup);
                let session_name = name.clone();
                tokio::spawn(async move {
                    let status = detached.wait().await;
                    let code = status.ok().and_then(|s| s.code());
                    coordinator
                        .run(&session_name, &CleanupTrigger::ConnectorExit(code))
                        .await;
                });
            }
            info!(session = %name, "connector backgrounded; returning control");
            return Ok(());
        }

        self.session.advance(SessionState::ForegroundWaiting);
        match self.session.wait_budget {
            Some(budget) => info!(
                session = %name,
                minutes = self.config.wait_minutes,
                "running connector in the foreground with a {budget:?} limit"
            ),
            None => info!(session = %name, "running connector in the foreground, no time limit"),
        }

        let trigger = wait::await_first_trigger(
            child.as_mut(),
            self.session.wait_budget,
            &*self.probe,
            wait::POLL_INTERVAL,
            &self.shutdown,
        )
        .await;
        info!(session = %name, %trigger, "wait finished");

        self.session.advance(SessionState::CleaningUp);
        self.cleanup.run(&name, &trigger).await;
        self.session.advance(SessionState::Terminated);
        signal_task.abort();
        Ok(())
    }

    /// Create the socket unless the created marker already exists, then
    /// tag it and announce the connection details.
    async fn create_session_if_needed(&mut self) -> Result<()> {
        let name = self.session.name.clone();
        let flags = self.cleanup.flags();

        if flags.has(CREATED_FLAG) {
            info!(session = %name, "socket already created; skipping creation");
            self.session.advance(SessionState::Created);
            return Ok(());
        }

        self.session.advance(SessionState::Creating);
        self.connector
            .create_session(&name, &self.session.ssh_username)
            .await?;
        if let Err(err) = flags.set(CREATED_FLAG) {
            warn!(session = %name, %err, "failed to write created marker");
        }

        let mut socket = self.api.fetch_socket(&name).await?;
        merge_workflow_tags(&mut socket, &self.config.ci);
        if let Err(err) = self.api.replace_tags(&socket).await {
            error!(session = %name, %err, "failed to update socket tags");
        }

        self.announce(&socket).await;
        self.session.advance(SessionState::Created);
        Ok(())
    }

    /// Print the console summary and post the optional webhook notice.
    /// Both are best-effort sinks.
    async fn announce(&self, socket: &SocketInfo) {
        let Some(org_name) = org_from_dns_name(&socket.dnsname, &self.session.name) else {
            warn!(
                dnsname = %socket.dnsname,
                "socket DNS name has unexpected shape; skipping announcement"
            );
            return;
        };

        let notice = ConnectionNotice {
            job_status: self.config.ci.job_status.clone(),
            workflow: self.config.ci.workflow.clone(),
            run_url: self.config.ci.run_url(),
            actor: self.config.ci.actor.clone(),
            dns_name: socket.dnsname.clone(),
            org_name,
            ssh_username: self.session.ssh_username.clone(),
        };
        print_summary(&notice);

        if let Some(url) = &self.config.slack_webhook_url {
            let notifier = WebhookNotifier::new(url.clone());
            match notifier.send(&message_blocks(&notice)).await {
                Ok(()) => info!("connection notice sent to webhook"),
                Err(err) => error!(%err, "failed to send webhook notice"),
            }
        } else {
            info!("no webhook URL provided; skipping chat notification");
        }
    }
}
