//! Charging session state machine

use chrono::{DateTime, Local};
use std::time::Duration;
use voltbay_api::{SessionInfo, SessionPhase};
use voltbay_config::CountdownPolicy;
use voltbay_util::{Identity, MonotonicInstant, Result, SessionId, StationError};

/// What a single tick did to a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not active, or no whole second has elapsed yet
    Unchanged,
    /// Remaining time went down
    Advanced,
    /// Remaining time reached zero on this tick
    Completed,
}

/// One charging episode bound to an identity
#[derive(Debug, Clone)]
pub struct ChargingSession {
    pub session_id: SessionId,

    /// Roster key
    pub owner: Identity,

    /// Display name of the owner
    pub label: String,

    /// Wall-clock start time (metadata only)
    pub started_at: DateTime<Local>,

    /// Monotonic start time (for the wall-clock countdown policy)
    pub started_at_mono: MonotonicInstant,

    pub duration_minutes: u32,

    remaining_seconds: u32,

    phase: SessionPhase,
}

impl ChargingSession {
    /// Create an active session with the full duration remaining
    pub fn new(
        owner: Identity,
        label: impl Into<String>,
        duration_minutes: u32,
        now: DateTime<Local>,
        now_mono: MonotonicInstant,
    ) -> Result<Self> {
        if duration_minutes == 0 {
            return Err(StationError::request("duration must be at least one minute"));
        }
        if owner.is_empty() {
            return Err(StationError::request("session owner cannot be empty"));
        }
        let total = duration_minutes
            .checked_mul(60)
            .ok_or_else(|| StationError::request("duration is too long"))?;

        Ok(Self {
            session_id: SessionId::new(),
            owner,
            label: label.into(),
            started_at: now,
            started_at_mono: now_mono,
            duration_minutes,
            remaining_seconds: total,
            phase: SessionPhase::Active,
        })
    }

    pub fn total_seconds(&self) -> u32 {
        // Checked at construction
        self.duration_minutes * 60
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        self.phase.is_active()
    }

    /// Time since the session started, by the monotonic clock
    pub fn elapsed(&self, now_mono: MonotonicInstant) -> Duration {
        now_mono.duration_since(self.started_at_mono)
    }

    /// Advance the countdown by one tick.
    ///
    /// Remaining time never increases. Once the session is no longer active
    /// this is a no-op, so ticking a completed session is idempotent.
    pub fn advance(&mut self, policy: CountdownPolicy, now_mono: MonotonicInstant) -> TickOutcome {
        if !self.is_active() {
            return TickOutcome::Unchanged;
        }

        let next = match policy {
            CountdownPolicy::PerTick => {
                if self.remaining_seconds <= 1 {
                    0
                } else {
                    self.remaining_seconds - 1
                }
            }
            CountdownPolicy::WallClock => {
                let elapsed = u32::try_from(self.elapsed(now_mono).as_secs()).unwrap_or(u32::MAX);
                self.total_seconds()
                    .saturating_sub(elapsed)
                    .min(self.remaining_seconds)
            }
        };

        if next == 0 {
            self.remaining_seconds = 0;
            self.phase = SessionPhase::Completed;
            TickOutcome::Completed
        } else if next < self.remaining_seconds {
            self.remaining_seconds = next;
            TickOutcome::Advanced
        } else {
            TickOutcome::Unchanged
        }
    }

    /// End early after an authorized stop. Only an active session can be stopped.
    pub fn mark_stopped(&mut self) -> bool {
        if !self.is_active() {
            return false;
        }
        self.phase = SessionPhase::Stopped;
        true
    }

    /// Force the session inactive because the emergency latch tripped.
    /// A session that already ended keeps its phase.
    pub fn mark_emergency_stopped(&mut self) {
        if self.is_active() {
            self.phase = SessionPhase::EmergencyStopped;
        }
    }

    pub fn to_info(&self) -> SessionInfo {
        SessionInfo {
            session_id: self.session_id.clone(),
            owner: self.owner.clone(),
            label: self.label.clone(),
            started_at: self.started_at,
            duration_minutes: self.duration_minutes,
            remaining_seconds: self.remaining_seconds,
            is_active: self.is_active(),
            phase: self.phase,
        }
    }
}

/// Result of stopping a session
#[derive(Debug, Clone)]
pub struct StopResult {
    pub session_id: SessionId,
    pub owner: Identity,
    pub remaining_seconds: u32,
    pub elapsed: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_session(minutes: u32) -> (ChargingSession, MonotonicInstant) {
        let now_mono = MonotonicInstant::now();
        let session =
            ChargingSession::new(Identity::user(1), "User 1", minutes, voltbay_util::now(), now_mono)
                .unwrap();
        (session, now_mono)
    }

    #[test]
    fn test_session_creation() {
        let (session, _) = make_session(30);
        assert_eq!(session.remaining_seconds(), 1800);
        assert_eq!(session.phase(), SessionPhase::Active);
        assert!(session.is_active());
    }

    #[test]
    fn test_creation_rejects_bad_input() {
        let now = voltbay_util::now();
        let mono = MonotonicInstant::now();
        assert!(matches!(
            ChargingSession::new(Identity::user(1), "", 0, now, mono),
            Err(StationError::InvalidRequest(_))
        ));
        assert!(matches!(
            ChargingSession::new(Identity::new(""), "", 30, now, mono),
            Err(StationError::InvalidRequest(_))
        ));
        assert!(matches!(
            ChargingSession::new(Identity::user(1), "", u32::MAX, now, mono),
            Err(StationError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_per_tick_countdown() {
        let (mut session, mono) = make_session(1);

        assert_eq!(session.advance(CountdownPolicy::PerTick, mono), TickOutcome::Advanced);
        assert_eq!(session.remaining_seconds(), 59);

        for _ in 0..57 {
            session.advance(CountdownPolicy::PerTick, mono);
        }
        assert_eq!(session.remaining_seconds(), 2);
        assert_eq!(session.advance(CountdownPolicy::PerTick, mono), TickOutcome::Advanced);
        assert_eq!(session.advance(CountdownPolicy::PerTick, mono), TickOutcome::Completed);
        assert_eq!(session.remaining_seconds(), 0);
        assert_eq!(session.phase(), SessionPhase::Completed);
    }

    #[test]
    fn test_tick_after_completion_is_idempotent() {
        let (mut session, mono) = make_session(1);
        for _ in 0..60 {
            session.advance(CountdownPolicy::PerTick, mono);
        }
        assert_eq!(session.phase(), SessionPhase::Completed);

        for _ in 0..5 {
            assert_eq!(session.advance(CountdownPolicy::PerTick, mono), TickOutcome::Unchanged);
        }
        assert_eq!(session.remaining_seconds(), 0);
        assert!(!session.is_active());
    }

    #[test]
    fn test_per_tick_ignores_missed_time() {
        // A tick arriving after a long pause still only removes one second
        let (mut session, mono) = make_session(10);
        session.advance(CountdownPolicy::PerTick, mono + Duration::from_secs(300));
        assert_eq!(session.remaining_seconds(), 599);
    }

    #[test]
    fn test_wall_clock_countdown_catches_up() {
        let (mut session, mono) = make_session(10);

        // Sub-second tick: nothing to remove yet
        let outcome = session.advance(CountdownPolicy::WallClock, mono + Duration::from_millis(400));
        assert_eq!(outcome, TickOutcome::Unchanged);
        assert_eq!(session.remaining_seconds(), 600);

        // Process was suspended for five minutes; the next tick reflects it
        session.advance(CountdownPolicy::WallClock, mono + Duration::from_secs(300));
        assert_eq!(session.remaining_seconds(), 300);

        // Time never runs backwards
        session.advance(CountdownPolicy::WallClock, mono + Duration::from_secs(10));
        assert_eq!(session.remaining_seconds(), 300);

        let outcome = session.advance(CountdownPolicy::WallClock, mono + Duration::from_secs(601));
        assert_eq!(outcome, TickOutcome::Completed);
        assert_eq!(session.remaining_seconds(), 0);
    }

    #[test]
    fn test_stop_and_emergency_marks() {
        let (mut session, mono) = make_session(5);
        session.advance(CountdownPolicy::PerTick, mono);
        assert!(session.mark_stopped());
        assert_eq!(session.phase(), SessionPhase::Stopped);
        assert_eq!(session.remaining_seconds(), 299);
        assert!(!session.mark_stopped());

        // Emergency does not rewrite an ended session
        session.mark_emergency_stopped();
        assert_eq!(session.phase(), SessionPhase::Stopped);

        let (mut other, _) = make_session(5);
        other.mark_emergency_stopped();
        assert_eq!(other.phase(), SessionPhase::EmergencyStopped);
        assert!(!other.is_active());
    }
}
