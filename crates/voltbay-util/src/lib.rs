//! Shared utilities for voltbay
//!
//! This crate provides:
//! - ID types (Identity, SessionId) and the validated AccessCode
//! - Time utilities (monotonic time, countdown formatting)
//! - The station error type
//! - Default paths for config and data directories

mod error;
mod ids;
mod paths;
mod time;

pub use error::*;
pub use ids::*;
pub use paths::*;
pub use time::*;
