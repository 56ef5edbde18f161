//! Events streamed from the station to its presentation layer

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use voltbay_util::{Identity, SessionId};

use crate::{ChargeDurations, Role, SessionInfo, StationSnapshot};

/// Event envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub timestamp: DateTime<Local>,
    pub payload: StationEvent,
}

impl Event {
    pub fn new(payload: StationEvent) -> Self {
        Self {
            timestamp: voltbay_util::now(),
            payload,
        }
    }
}

/// Everything the station reports to listeners
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StationEvent {
    /// Full state snapshot (sent after major changes)
    StateChanged(StationSnapshot),

    LoggedIn {
        identity: Identity,
        role: Role,
    },

    LoggedOut,

    SessionStarted(SessionInfo),

    /// Countdown advanced; carries the session as it is after the tick
    SessionTick(SessionInfo),

    SessionCompleted {
        session_id: SessionId,
        owner: Identity,
    },

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
