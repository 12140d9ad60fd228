#![forbid(unsafe_code)]

//! `socket-sentry` — CI tunnel session supervisor.
//!
//! Provisions a named SSH socket for one workflow run, keeps the
//! connector process alive for the run (or a bounded wait window), and
//! guarantees the socket is deleted exactly once no matter how the run
//! terminates.

pub mod api;
pub mod config;
pub mod connector;
pub mod errors;
pub mod models;
pub mod slack;
pub mod supervisor;

pub use config::RunConfig;
pub use errors::{AppError, Result};
