//! Error types for voltbay station operations

use thiserror::Error;

/// Outcome of a rejected station operation.
///
/// Every variant is an expected business result. An operation that returns
/// one of these has left the station state exactly as it found it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StationError {
    #[error("Invalid code")]
    InvalidCode,

    #[error("Code must be exactly 4 digits")]
    InvalidFormat,

    #[error("Code is already in use")]
    DuplicateCode,

    #[error("The admin code cannot be changed")]
    AdminCodeImmutable,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Emergency stop is active")]
    EmergencyActive,

    #[error("No active charging session")]
    NoActiveSession,

    #[error("Session is still active")]
    SessionStillActive,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl StationError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    pub fn request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, StationError>;
