//! Shared types for the voltbay station
//!
//! This crate defines the values exchanged between the station core and
//! whatever presents it (kiosk screens, monitoring views):
//! - Roles and authentication outcomes
//! - Session views and the station snapshot
//! - Charge duration options
//! - Events

mod events;
mod types;

pub use events::*;
pub use types::*;
