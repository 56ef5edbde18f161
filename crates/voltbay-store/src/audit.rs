//! Audit event types
//!
//! Codes are secrets and never appear here; code changes are recorded by
//! position and resulting set size only.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use voltbay_api::{ChargeDurations, Role};
use voltbay_util::{Identity, SessionId};

/// Types of audit events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditEventType {
    ServiceStarted,

    ServiceStopped,

    LoginSucceeded {
        identity: Identity,
        role: Role,
    },

    LoginFailed,

    SessionStarted {
        session_id: SessionId,
        owner: Identity,
        duration_minutes: u32,
        /// A previous roster entry for the same owner was replaced
        replaced: bool,
    },

    SessionCompleted {
        session_id: SessionId,
        owner: Identity,
    },

    SessionStopped {
        session_id: SessionId,
        owner: Identity,
        remaining_seconds: u32,
    },

    /// A stop was attempted and refused
    StopDenied {
        reason: String,
    },

    EmergencyStopTriggered {
        sessions_cleared: usize,
    },

    EmergencyStopReset,

    UserCodeAdded {
        position: usize,
        count: usize,
    },

    UserCodeRemoved {
        count: usize,
    },

    DurationsChanged {
        durations: ChargeDurations,
    },
}

/// Full audit event with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Unique event ID
    pub id: i64,

    /// Event timestamp
    pub timestamp: DateTime<Local>,

    /// Event type and details
    pub event: AuditEventType,
}

impl AuditEvent {
    pub fn new(event: AuditEventType) -> Self {
        Self {
            id: 0, // Will be set by store
            timestamp: voltbay_util::now(),
            event,
        }
    }
}
