//! Unit tests for the session model and its state machine.

use std::path::PathBuf;
use std::time::Duration;

use socket_sentry::config::{CiContext, RunConfig};
use socket_sentry::models::session::{Session, SessionMode, SessionState};

fn config(background: bool, wait_minutes: u64) -> RunConfig {
    RunConfig {
        access_token: "tkn".into(),
        slack_webhook_url: None,
        background,
        cleanup_only: false,
        wait_minutes,
        state_dir: PathBuf::from("/tmp"),
        connector_bin: PathBuf::from("./border0"),
        ssh_username: "runner".into(),
        ci: CiContext {
            repository: "acme/widgets".into(),
            run_id: "42".into(),
            run_attempt: "3".into(),
            workflow: "build".into(),
            server_url: "https://github.com".into(),
            actor: "octocat".into(),
            job_status: "Success".into(),
        },
    }
}

#[test]
fn session_derives_name_and_mode() {
    let session = Session::from_config(&config(true, 5));

    assert_eq!(session.name, "acme-widgets-42-3");
    assert_eq!(session.mode, SessionMode::Background);
    assert_eq!(session.wait_budget, Some(Duration::from_secs(300)));
    assert_eq!(session.state, SessionState::Idle);
}

#[test]
fn foreground_is_the_default_mode() {
    let session = Session::from_config(&config(false, 0));
    assert_eq!(session.mode, SessionMode::Foreground);
    assert_eq!(session.wait_budget, None);
}

#[test]
fn happy_path_transitions_are_permitted() {
    let mut session = Session::from_config(&config(false, 0));

    for next in [
        SessionState::Creating,
        SessionState::Created,
        SessionState::ForegroundWaiting,
        SessionState::CleaningUp,
        SessionState::Terminated,
    ] {
        assert!(session.can_transition_to(next), "expected {next:?} allowed");
        session.advance(next);
        assert_eq!(session.state, next);
    }
}

#[test]
fn creating_may_be_skipped_when_marker_exists() {
    let session = Session::from_config(&config(false, 0));
    assert!(session.can_transition_to(SessionState::Created));
}

#[test]
fn cleanup_is_reachable_from_every_live_state() {
    for state in [
        SessionState::Idle,
        SessionState::Created,
        SessionState::ForegroundWaiting,
        SessionState::Backgrounded,
    ] {
        let mut session = Session::from_config(&config(false, 0));
        session.state = state;
        assert!(
            session.can_transition_to(SessionState::CleaningUp),
            "cleanup unreachable from {state:?}"
        );
    }
}

#[test]
fn terminated_is_terminal() {
    let mut session = Session::from_config(&config(false, 0));
    session.state = SessionState::Terminated;

    for next in [
        SessionState::Idle,
        SessionState::Creating,
        SessionState::Created,
        SessionState::ForegroundWaiting,
        SessionState::Backgrounded,
        SessionState::CleaningUp,
    ] {
        assert!(!session.can_transition_to(next));
    }
}

#[test]
fn invalid_transition_is_ignored() {
    let mut session = Session::from_config(&config(false, 0));
    session.advance(SessionState::Terminated);
    assert_eq!(session.state, SessionState::Idle, "invalid advance is a no-op");
}
