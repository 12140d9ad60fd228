//! Unit tests for the liveness probe and connector invocation pattern.

use std::path::Path;

use socket_sentry::connector::liveness::{Liveness, PgrepProbe};
use socket_sentry::connector::connect_pattern;

#[test]
fn pattern_matches_the_connect_invocation() {
    assert_eq!(
        connect_pattern(Path::new("./border0")),
        "./border0 socket connect"
    );
    assert_eq!(
        connect_pattern(Path::new("/usr/local/bin/border0")),
        "/usr/local/bin/border0 socket connect"
    );
}

#[test]
fn probe_keeps_its_pattern() {
    let probe = PgrepProbe::new("./border0 socket connect");
    assert_eq!(probe.pattern(), "./border0 socket connect");
}

/// A pattern no process can plausibly match reports not-running.
#[tokio::test]
async fn absent_process_reports_not_running() {
    let probe = PgrepProbe::new("socket-sentry-liveness-test-7f3a9c-no-such-process");
    assert!(!probe.is_running().await);
}
