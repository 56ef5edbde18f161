//! Shared types for the voltbay station

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use voltbay_util::{Identity, SessionId};

/// Role granted by a successful code match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn is_admin(self) -> bool {
        matches!(self, Role::Admin)
    }
}

/// Result of a successful authentication
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authenticated {
    pub role: Role,
    /// Stable key (`admin`, `user-<k>`)
    pub identity: Identity,
    /// Human-readable name for display
    pub label: String,
}

impl Authenticated {
    pub fn admin() -> Self {
        Self {
            role: Role::Admin,
            identity: Identity::admin(),
            label: "Administrator".into(),
        }
    }

    /// Authenticated user whose code sits at 1-based `position`
    pub fn user(position: usize) -> Self {
        Self {
            role: Role::User,
            identity: Identity::user(position),
            label: format!("User {}", position),
        }
    }
}

/// Where a charging session is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// Counting down
    Active,
    /// Countdown reached zero
    Completed,
    /// Ended early with a valid code
    Stopped,
    /// Ended by the emergency latch
    EmergencyStopped,
}

impl SessionPhase {
    pub fn is_active(self) -> bool {
        matches!(self, SessionPhase::Active)
    }
}

/// View of a charging session for display and monitoring
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub session_id: SessionId,
    pub owner: Identity,
    pub label: String,
    pub started_at: DateTime<Local>,
    pub duration_minutes: u32,
    pub remaining_seconds: u32,
    pub is_active: bool,
    pub phase: SessionPhase,
}

impl SessionInfo {
    pub fn total_seconds(&self) -> u32 {
        self.duration_minutes.saturating_mul(60)
    }

    /// Charged fraction in percent, 0 at start and 100 when done
    pub fn progress_percent(&self) -> f64 {
        let total = self.total_seconds();
        if total == 0 {
            return 100.0;
        }
        f64::from(total - self.remaining_seconds.min(total)) / f64::from(total) * 100.0
    }

    /// Remaining time as `MM:SS`
    pub fn countdown(&self) -> String {
        voltbay_util::format_countdown(self.remaining_seconds)
    }
}

/// Named slot in the duration picker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationSlot {
    Short,
    Medium,
    Long,
}

/// Allowed session lengths, in minutes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargeDurations {
    pub short: u32,
    pub medium: u32,
    pub long: u32,
}

impl ChargeDurations {
    pub const DEFAULT_SHORT: u32 = 30;
    pub const DEFAULT_MEDIUM: u32 = 60;
    pub const DEFAULT_LONG: u32 = 90;

    pub fn new(short: u32, medium: u32, long: u32) -> Self {
        Self { short, medium, long }
    }

    /// The three options in display order
    pub fn options(&self) -> [(DurationSlot, u32); 3] {
        [
            (DurationSlot::Short, self.short),
            (DurationSlot::Medium, self.medium),
            (DurationSlot::Long, self.long),
        ]
    }

    pub fn get(&self, slot: DurationSlot) -> u32 {
        match slot {
            DurationSlot::Short => self.short,
            DurationSlot::Medium => self.medium,
            DurationSlot::Long => self.long,
        }
    }
}

impl Default for ChargeDurations {
    fn default() -> Self {
        Self {
            short: Self::DEFAULT_SHORT,
            medium: Self::DEFAULT_MEDIUM,
            long: Self::DEFAULT_LONG,
        }
    }
}

/// Full station state, as read by the presentation layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationSnapshot {
    pub station_name: String,
    pub emergency_stop: bool,
    pub current_user: Option<Authenticated>,
    pub current_session: Option<SessionInfo>,
    pub roster: Vec<SessionInfo>,
    pub durations: ChargeDurations,
    pub user_code_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_info(duration_minutes: u32, remaining_seconds: u32) -> SessionInfo {
        SessionInfo {
            session_id: SessionId::new(),
            owner: Identity::user(1),
            label: "User 1".into(),
            started_at: voltbay_util::now(),
            duration_minutes,
            remaining_seconds,
            is_active: true,
            phase: SessionPhase::Active,
        }
    }

    #[test]
    fn authenticated_labels_are_separate_from_identity() {
        let user = Authenticated::user(3);
        assert_eq!(user.identity.as_str(), "user-3");
        assert_eq!(user.label, "User 3");
        assert_eq!(user.role, Role::User);

        let admin = Authenticated::admin();
        assert_eq!(admin.identity.as_str(), "admin");
        assert!(admin.role.is_admin());
    }

    #[test]
    fn session_progress() {
        assert_eq!(make_info(30, 1800).progress_percent(), 0.0);
        assert_eq!(make_info(30, 900).progress_percent(), 50.0);
        assert_eq!(make_info(30, 0).progress_percent(), 100.0);
        assert_eq!(make_info(60, 3590).countdown(), "59:50");
    }

    #[test]
    fn default_durations() {
        let d = ChargeDurations::default();
        assert_eq!(d, ChargeDurations::new(30, 60, 90));
        assert_eq!(d.get(DurationSlot::Medium), 60);
        assert_eq!(d.options()[2], (DurationSlot::Long, 90));
    }

    #[test]
    fn role_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
        assert_eq!(
            serde_json::to_string(&SessionPhase::EmergencyStopped).unwrap(),
            "\"emergency_stopped\""
        );
    }
}
