//! Core events emitted by the engine

use voltbay_api::{ChargeDurations, Role, SessionInfo, StationEvent};
use voltbay_util::{Identity, SessionId};

/// Events emitted by the station engine
#[derive(Debug, Clone)]
pub enum CoreEvent {
    LoggedIn {
        identity: Identity,
        role: Role,
    },

    LoggedOut,

    SessionStarted(SessionInfo),

    /// Countdown advanced
    SessionTick(SessionInfo),

    /// Countdown reached zero
    SessionCompleted {
        session_id: SessionId,
        owner: Identity,
    },

    /// Session ended early with a valid code
    SessionStopped {
        session_id: SessionId,
        owner: Identity,
        remaining_seconds: u32,
    },

    EmergencyStopTriggered {
        sessions_cleared: usize,
    },

    EmergencyStopReset,

    DurationsChanged(ChargeDurations),

    UserCodesChanged {
        count: usize,
    },
}

impl From<CoreEvent> for StationEvent {
    fn from(event: CoreEvent) -> Self {
        match event {
            CoreEvent::LoggedIn { identity, role } => StationEvent::LoggedIn { identity, role },
            CoreEvent::LoggedOut => StationEvent::LoggedOut,
            CoreEvent::SessionStarted(info) => StationEvent::SessionStarted(info),
            CoreEvent::SessionTick(info) => StationEvent::SessionTick(info),
            CoreEvent::SessionCompleted { session_id, owner } => {
                StationEvent::SessionCompleted { session_id, owner }
            }
            CoreEvent::SessionStopped {
                session_id,
                owner,
                remaining_seconds,
            } => StationEvent::SessionStopped {
                session_id,
                owner,
                remaining_seconds,
            },
            CoreEvent::EmergencyStopTriggered { sessions_cleared } => {
                StationEvent::EmergencyStopTriggered { sessions_cleared }
            }
            CoreEvent::EmergencyStopReset => StationEvent::EmergencyStopReset,
            CoreEvent::DurationsChanged(durations) => StationEvent::DurationsChanged(durations),
            CoreEvent::UserCodesChanged { count } => StationEvent::UserCodesChanged { count },
        }
    }
}
