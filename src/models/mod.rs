//! Domain entities.

pub mod session;
