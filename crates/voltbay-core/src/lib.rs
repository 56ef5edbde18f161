//! Station state manager for voltbay
//!
//! This crate is the heart of the kiosk, containing:
//! - The code book (admin code plus the persisted user code set)
//! - Authentication by shared code
//! - Session state machine (Active -> Completed | Stopped | EmergencyStopped)
//! - The monitoring roster and the emergency latch
//! - The tick runtime that drives countdowns

mod auth;
mod codes;
mod durations;
mod emergency;
mod engine;
mod events;
mod roster;
mod runtime;
mod session;

pub use auth::*;
pub use codes::*;
pub use durations::*;
pub use emergency::*;
pub use engine::*;
pub use events::*;
pub use roster::*;
pub use runtime::*;
pub use session::*;
