//! Error types shared across the application.

use std::fmt::{Display, Formatter};

/// Shared application result type.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error enumeration covering all domain failure modes.
#[derive(Debug)]
pub enum AppError {
    /// Missing or invalid configuration input. Fatal before any remote
    /// or process action is taken.
    Config(String),
    /// Control-plane API failure (non-2xx response or transport error).
    Api(String),
    /// Connector binary could not be started.
    Launch(String),
    /// Idempotency marker could not be written.
    Persistence(String),
    /// Notification delivery failure (console or webhook).
    Notify(String),
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Api(msg) => write!(f, "api: {msg}"),
            Self::Launch(msg) => write!(f, "launch: {msg}"),
            Self::Persistence(msg) => write!(f, "persistence: {msg}"),
            Self::Notify(msg) => write!(f, "notify: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        Self::Api(err.to_string())
    }
}