//! Connector launcher with double-launch avoidance.

use tokio::process::Child;
use tracing::{info, info_span};

use crate::connector::liveness::Liveness;
use crate::connector::ConnectorCli;
use crate::models::session::Session;
use crate::Result;

/// Start the connector for `session` unless one is already running.
///
/// When the liveness probe reports a matching process, the launch is
/// skipped and `None` is returned; the supervisor then degrades to
/// monitoring-only and never owns a process handle.
///
/// # Errors
///
/// Returns [`AppError::Launch`](crate::AppError::Launch) if the connector
/// process cannot be spawned at all.
pub async fn launch(
    cli: &dyn ConnectorCli,
    probe: &dyn Liveness,
    session: &Session,
) -> Result<Option<Child>> {
    let span = info_span!("launch_connector", session = %session.name);
    let _guard = span.enter();

    if probe.is_running().await {
        info!("connector already running; skipping launch");
        return Ok(None);
    }

    let child = cli
        .spawn_connector(&session.name, &session.ssh_username, session.mode)
        .await?;
    Ok(Some(child))
}
