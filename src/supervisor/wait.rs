//! Wait/timeout controller.
//!
//! Races the wait deadline, the connector's own exit, a periodic
//! liveness probe, and the shutdown token; the first to resolve names
//! the cleanup trigger. The probe is a deliberately redundant failure
//! detection path — whichever source observes termination first wins.

use std::future::pending;
use std::time::Duration;

use tokio::process::Child;
use tokio::time::{interval_at, sleep, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::connector::liveness::Liveness;
use crate::supervisor::CleanupTrigger;

/// Interval between periodic liveness probes.
pub const POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Wait for the first cleanup trigger.
///
/// * `child` — the connector handle, or `None` when the supervisor is
///   monitoring a pre-existing connector.
/// * `wait_budget` — deadline before forced cleanup; `None` waits
///   unbounded.
/// * `probe` — periodic liveness check, polled every `poll_interval`.
/// * `shutdown` — cancelled by the signal bridge on SIGINT/SIGTERM.
///
/// The child handle is only waited on, never consumed, so the caller
/// keeps ownership (and the kill-on-drop behavior) after the race.
pub async fn await_first_trigger(
    child: Option<&mut Child>,
    wait_budget: Option<Duration>,
    probe: &dyn Liveness,
    poll_interval: Duration,
    shutdown: &CancellationToken,
) -> CleanupTrigger {
    let has_child = child.is_some();

    let exit = async move {
        match child {
            Some(child) => child.wait().await,
            None => pending().await,
        }
    };
    let deadline = async {
        match wait_budget {
            Some(budget) => sleep(budget).await,
            None => pending().await,
        }
    };
    tokio::pin!(exit, deadline);

    // First probe fires one full interval in, not immediately.
    let mut poll = interval_at(Instant::now() + poll_interval, poll_interval);
    poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            () = shutdown.cancelled() => return CleanupTrigger::Signal,
            () = &mut deadline => return CleanupTrigger::Deadline,
            status = &mut exit, if has_child => {
                return CleanupTrigger::ConnectorExit(status.ok().and_then(|s| s.code()));
            }
            _ = poll.tick() => {
                if !probe.is_running().await {
                    return CleanupTrigger::LivenessLost;
                }
            }
        }
    }
}
