//! Station state engine

use chrono::{DateTime, Local};
use std::sync::Arc;
use tracing::{debug, info, warn};
use voltbay_api::{Authenticated, ChargeDurations, DurationSlot, SessionInfo, StationSnapshot};
use voltbay_config::{CountdownPolicy, StationConfig};
use voltbay_store::{AuditEvent, AuditEventType, Store};
use voltbay_util::{Identity, MonotonicInstant, Result, StationError};

use crate::{
    ChargingSession, CodeBook, CoreEvent, DurationConfig, EmergencyLatch, Roster, StopResult,
    TickOutcome, authenticate, validate_code,
};

/// The station state engine.
///
/// A synchronous state machine; every operation takes `&mut self`, so the
/// owner serializes all mutations. Time is always passed in by the caller.
pub struct StationEngine {
    station_name: String,
    codes: CodeBook,
    durations: DurationConfig,
    latch: EmergencyLatch,
    roster: Roster,
    current_session: Option<ChargingSession>,
    current_user: Option<Authenticated>,
    countdown: CountdownPolicy,
    store: Arc<dyn Store>,
}

impl StationEngine {
    /// Build the engine, loading the user code set from the store
    pub fn new(config: &StationConfig, store: Arc<dyn Store>) -> Result<Self> {
        let codes = CodeBook::load(
            config.admin_code.clone(),
            &config.default_user_codes,
            store.clone(),
        );
        let durations = DurationConfig::new(config.durations)?;

        info!(
            station = %config.station.name,
            user_codes = codes.len(),
            countdown = ?config.station.countdown,
            "Station engine initialized"
        );

        Ok(Self {
            station_name: config.station.name.clone(),
            codes,
            durations,
            latch: EmergencyLatch::default(),
            roster: Roster::new(),
            current_session: None,
            current_user: None,
            countdown: config.station.countdown,
            store,
        })
    }

    // Login state

    /// Authenticate and remember who is at the kiosk.
    ///
    /// A failed attempt leaves the previous login in place.
    pub fn login(&mut self, code: &str) -> Result<Authenticated> {
        match authenticate(&self.codes, code) {
            Ok(auth) => {
                let _ = self.store.append_audit(AuditEvent::new(AuditEventType::LoginSucceeded {
                    identity: auth.identity.clone(),
                    role: auth.role,
                }));
                info!(identity = %auth.identity, role = ?auth.role, "Login succeeded");
                self.current_user = Some(auth.clone());
                Ok(auth)
            }
            Err(e) => {
                let _ = self.store.append_audit(AuditEvent::new(AuditEventType::LoginFailed));
                warn!("Login failed");
                Err(e)
            }
        }
    }

    /// Forget the current user. Sessions are unaffected.
    pub fn logout(&mut self) -> Option<Authenticated> {
        let previous = self.current_user.take();
        if let Some(auth) = &previous {
            info!(identity = %auth.identity, "Logged out");
        }
        previous
    }

    pub fn current_user(&self) -> Option<&Authenticated> {
        self.current_user.as_ref()
    }

    // Sessions

    /// Start a charging session for `owner`.
    ///
    /// The new session becomes current and replaces any roster entry the
    /// owner already had.
    pub fn start_charging(
        &mut self,
        duration_minutes: u32,
        owner: &Identity,
        now: DateTime<Local>,
        now_mono: MonotonicInstant,
    ) -> Result<SessionInfo> {
        if self.latch.is_tripped() {
            warn!(owner = %owner, "Start refused while emergency stop is active");
            return Err(StationError::EmergencyActive);
        }

        let label = match &self.current_user {
            Some(auth) if &auth.identity == owner => auth.label.clone(),
            _ => owner.to_string(),
        };

        let session = ChargingSession::new(owner.clone(), label, duration_minutes, now, now_mono)?;
        let info = session.to_info();

        let replaced = self.roster.upsert(session.clone()).is_some();
        self.current_session = Some(session);

        let _ = self.store.append_audit(AuditEvent::new(AuditEventType::SessionStarted {
            session_id: info.session_id.clone(),
            owner: owner.clone(),
            duration_minutes,
            replaced,
        }));

        info!(
            session_id = %info.session_id,
            owner = %owner,
            duration_minutes,
            replaced,
            "Charging session started"
        );

        Ok(info)
    }

    /// Start a session for the logged-in user with the minutes of `slot`.
    ///
    /// `confirm_code` must be any valid code. Nobody logged in is a request
    /// error.
    pub fn start_for_current_user(
        &mut self,
        slot: DurationSlot,
        confirm_code: &str,
        now: DateTime<Local>,
        now_mono: MonotonicInstant,
    ) -> Result<SessionInfo> {
        let Some(owner) = self.current_user.as_ref().map(|auth| auth.identity.clone()) else {
            return Err(StationError::request("nobody is logged in"));
        };
        if !self.validate_code(confirm_code) {
            return Err(StationError::InvalidCode);
        }
        let minutes = self.durations().get(slot);
        self.start_charging(minutes, &owner, now, now_mono)
    }

    /// Advance every active countdown by one tick.
    ///
    /// Inert while the emergency latch is tripped. The current session is
    /// written back to the roster when its entry still belongs to it; other
    /// active roster entries are advanced in place.
    pub fn tick(&mut self, now_mono: MonotonicInstant) -> Vec<CoreEvent> {
        let mut events = Vec::new();
        if self.latch.is_tripped() {
            return events;
        }

        let mut completed = Vec::new();
        let policy = self.countdown;

        if let Some(session) = &mut self.current_session
            && session.is_active()
        {
            let outcome = session.advance(policy, now_mono);
            if outcome != TickOutcome::Unchanged {
                self.roster.write_back(session);
                events.push(CoreEvent::SessionTick(session.to_info()));
            }
            if outcome == TickOutcome::Completed {
                completed.push((session.session_id.clone(), session.owner.clone()));
            }
        }

        let current_id = self.current_session.as_ref().map(|s| s.session_id.clone());
        for entry in self.roster.iter_mut() {
            if !entry.is_active() || Some(&entry.session_id) == current_id.as_ref() {
                continue;
            }
            let outcome = entry.advance(policy, now_mono);
            if outcome != TickOutcome::Unchanged {
                events.push(CoreEvent::SessionTick(entry.to_info()));
            }
            if outcome == TickOutcome::Completed {
                completed.push((entry.session_id.clone(), entry.owner.clone()));
            }
        }

        for (session_id, owner) in completed {
            let _ = self.store.append_audit(AuditEvent::new(AuditEventType::SessionCompleted {
                session_id: session_id.clone(),
                owner: owner.clone(),
            }));
            info!(session_id = %session_id, owner = %owner, "Charging session completed");
            events.push(CoreEvent::SessionCompleted { session_id, owner });
        }

        events
    }

    /// Stop the current session with any valid code.
    ///
    /// On success the session is marked stopped and its roster entry removed.
    /// On failure nothing changes.
    pub fn stop_charging(&mut self, code: &str, now_mono: MonotonicInstant) -> Result<StopResult> {
        if !self.current_session.as_ref().is_some_and(|s| s.is_active()) {
            self.deny_stop("no active session");
            return Err(StationError::NoActiveSession);
        }

        if !validate_code(&self.codes, code) {
            self.deny_stop("invalid code");
            return Err(StationError::InvalidCode);
        }

        let Some(session) = self.current_session.as_mut() else {
            return Err(StationError::NoActiveSession);
        };
        session.mark_stopped();
        let result = StopResult {
            session_id: session.session_id.clone(),
            owner: session.owner.clone(),
            remaining_seconds: session.remaining_seconds(),
            elapsed: session.elapsed(now_mono),
        };

        if self.roster.contains_session(&result.session_id) {
            self.roster.remove(&result.owner);
        }

        let _ = self.store.append_audit(AuditEvent::new(AuditEventType::SessionStopped {
            session_id: result.session_id.clone(),
            owner: result.owner.clone(),
            remaining_seconds: result.remaining_seconds,
        }));

        info!(
            session_id = %result.session_id,
            owner = %result.owner,
            remaining_seconds = result.remaining_seconds,
            "Charging session stopped"
        );

        Ok(result)
    }

    fn deny_stop(&self, reason: &str) {
        let _ = self.store.append_audit(AuditEvent::new(AuditEventType::StopDenied {
            reason: reason.to_string(),
        }));
        warn!(reason, "Stop denied");
    }

    /// Clear the current session after it ended.
    pub fn acknowledge_completion(&mut self) -> Result<()> {
        match &self.current_session {
            None => Err(StationError::NoActiveSession),
            Some(s) if s.is_active() => Err(StationError::SessionStillActive),
            Some(s) => {
                debug!(session_id = %s.session_id, "Session acknowledged");
                self.current_session = None;
                Ok(())
            }
        }
    }

    /// Remove an ended roster entry. Returns whether an entry was removed.
    pub fn dismiss(&mut self, owner: &Identity) -> Result<bool> {
        match self.roster.get(owner) {
            None => Ok(false),
            Some(entry) if entry.is_active() => Err(StationError::SessionStillActive),
            Some(_) => {
                self.roster.remove(owner);
                debug!(owner = %owner, "Roster entry dismissed");
                Ok(true)
            }
        }
    }

    pub fn current_session(&self) -> Option<SessionInfo> {
        self.current_session.as_ref().map(ChargingSession::to_info)
    }

    pub fn roster(&self) -> Vec<SessionInfo> {
        self.roster.infos()
    }

    /// Whether a countdown still needs driving
    pub fn needs_tick(&self) -> bool {
        if self.latch.is_tripped() {
            return false;
        }
        self.current_session.as_ref().is_some_and(|s| s.is_active()) || self.roster.has_active()
    }

    // Emergency latch

    /// Trip the latch, deactivate the current session and clear the roster.
    ///
    /// Safe to call repeatedly; only the first call emits an event.
    pub fn trigger_emergency_stop(&mut self, now: DateTime<Local>) -> Option<CoreEvent> {
        if let Some(session) = &mut self.current_session {
            session.mark_emergency_stopped();
        }
        let sessions_cleared = self.roster.clear();

        if !self.latch.trip(now) {
            debug!("Emergency stop already active");
            return None;
        }

        let _ = self.store.append_audit(AuditEvent::new(
            AuditEventType::EmergencyStopTriggered { sessions_cleared },
        ));
        warn!(sessions_cleared, "Emergency stop triggered");

        Some(CoreEvent::EmergencyStopTriggered { sessions_cleared })
    }

    /// Clear the latch and the current session. The login is kept.
    ///
    /// When the latch is not tripped this is a no-op: the current session,
    /// including an active one, is left alone and no event is produced.
    pub fn reset_emergency_stop(&mut self) -> Option<CoreEvent> {
        if !self.latch.reset() {
            debug!("Emergency stop reset requested but latch is not tripped");
            return None;
        }
        self.current_session = None;

        let _ = self.store.append_audit(AuditEvent::new(AuditEventType::EmergencyStopReset));
        info!("Emergency stop reset");

        Some(CoreEvent::EmergencyStopReset)
    }

    pub fn is_emergency_stop(&self) -> bool {
        self.latch.is_tripped()
    }

    pub fn emergency_tripped_at(&self) -> Option<DateTime<Local>> {
        self.latch.tripped_at()
    }

    // Durations

    pub fn durations(&self) -> ChargeDurations {
        self.durations.get()
    }

    pub fn set_durations(&mut self, durations: ChargeDurations) -> Result<()> {
        self.durations.set(durations)?;
        let _ = self
            .store
            .append_audit(AuditEvent::new(AuditEventType::DurationsChanged { durations }));
        Ok(())
    }

    // User codes

    /// Add a user code; returns its 1-based position
    pub fn add_user_code(&mut self, code: &str) -> Result<usize> {
        let position = self.codes.add_user_code(code)?;
        let _ = self.store.append_audit(AuditEvent::new(AuditEventType::UserCodeAdded {
            position,
            count: self.codes.len(),
        }));
        Ok(position)
    }

    pub fn remove_user_code(&mut self, code: &str) -> Result<bool> {
        let removed = self.codes.remove_user_code(code)?;
        if removed {
            let _ = self.store.append_audit(AuditEvent::new(AuditEventType::UserCodeRemoved {
                count: self.codes.len(),
            }));
        }
        Ok(removed)
    }

    /// Whether `code` is the admin code or any user code
    pub fn validate_code(&self, code: &str) -> bool {
        validate_code(&self.codes, code)
    }

    pub fn user_codes(&self) -> Vec<String> {
        self.codes.user_codes()
    }

    pub fn user_code_count(&self) -> usize {
        self.codes.len()
    }

    /// Full state snapshot for display
    pub fn snapshot(&self) -> StationSnapshot {
        StationSnapshot {
            station_name: self.station_name.clone(),
            emergency_stop: self.latch.is_tripped(),
            current_user: self.current_user.clone(),
            current_session: self.current_session(),
            roster: self.roster(),
            durations: self.durations(),
            user_code_count: self.codes.len(),
        }
    }
}
