#![forbid(unsafe_code)]

//! `socket-sentry` — CI tunnel session supervisor binary.
//!
//! Assembles configuration from CLI flags and the CI environment, then
//! drives one tunnel session from socket creation through guaranteed
//! teardown.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use socket_sentry::config::{self, CiContext, RunConfig};
use socket_sentry::supervisor::Supervisor;
use socket_sentry::{AppError, Result};

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "socket-sentry", about = "CI tunnel session supervisor", version, long_about = None)]
struct Cli {
    /// Run the teardown path only; no creation or connector launch.
    #[arg(long)]
    cleanup: bool,

    /// Detach the connector and return immediately after launch.
    #[arg(long)]
    background: bool,

    /// Minutes before forced cleanup; 0 waits for the connector.
    #[arg(long, default_value_t = 0)]
    wait_minutes: u64,

    /// Chat webhook URL for the connection notice.
    #[arg(long)]
    slack_webhook_url: Option<String>,

    /// Directory for the run-scoped idempotency markers.
    #[arg(long)]
    state_dir: Option<PathBuf>,

    /// Path to the connector binary.
    #[arg(long)]
    connector_bin: Option<PathBuf>,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.log_format)?;
    info!("socket-sentry bootstrap");

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?
        .block_on(run(args))
}

async fn run(args: Cli) -> Result<()> {
    let ci = CiContext::from_env()?;
    let config = RunConfig {
        access_token: config::load_access_token()?,
        slack_webhook_url: args.slack_webhook_url,
        background: args.background,
        cleanup_only: args.cleanup,
        wait_minutes: args.wait_minutes,
        state_dir: args.state_dir.unwrap_or_else(config::default_state_dir),
        connector_bin: args
            .connector_bin
            .unwrap_or_else(|| PathBuf::from(socket_sentry::connector::DEFAULT_CONNECTOR_BIN)),
        ssh_username: config::ssh_username()?,
        ci,
    };
    config.validate()?;
    info!(session = %config.session_name(), "configuration loaded");

    Supervisor::new(config).run().await?;
    info!("socket-sentry done");
    Ok(())
}

fn init_tracing(log_format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(env_filter);

    match log_format {
        LogFormat::Text => subscriber
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
    }

    Ok(())
}
