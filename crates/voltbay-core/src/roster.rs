//! Monitoring roster: the latest session per identity

use voltbay_api::SessionInfo;
use voltbay_util::{Identity, SessionId};

use crate::ChargingSession;

/// Sessions keyed by owner, at most one per identity, in start order.
///
/// Entries stay after they complete or are stopped until dismissed or
/// cleared by the emergency latch.
#[derive(Debug, Default)]
pub struct Roster {
    entries: Vec<ChargingSession>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a session, replacing any previous entry for the same owner.
    ///
    /// The new entry moves to the end. Returns the replaced entry, if any.
    pub fn upsert(&mut self, session: ChargingSession) -> Option<ChargingSession> {
        let replaced = self
            .entries
            .iter()
            .position(|s| s.owner == session.owner)
            .map(|idx| self.entries.remove(idx));
        self.entries.push(session);
        replaced
    }

    /// Overwrite the entry that holds the same session.
    ///
    /// Does nothing when the owner's entry now belongs to a newer session
    /// or was dismissed.
    pub fn write_back(&mut self, session: &ChargingSession) -> bool {
        match self.entries.iter_mut().find(|s| s.owner == session.owner) {
            Some(entry) if entry.session_id == session.session_id => {
                *entry = session.clone();
                true
            }
            _ => false,
        }
    }

    pub fn remove(&mut self, owner: &Identity) -> Option<ChargingSession> {
        let idx = self.entries.iter().position(|s| &s.owner == owner)?;
        Some(self.entries.remove(idx))
    }

    /// Drop every entry; returns how many were dropped
    pub fn clear(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        count
    }

    pub fn get(&self, owner: &Identity) -> Option<&ChargingSession> {
        self.entries.iter().find(|s| &s.owner == owner)
    }

    pub fn contains_session(&self, session_id: &SessionId) -> bool {
        self.entries.iter().any(|s| &s.session_id == session_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChargingSession> {
        self.entries.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ChargingSession> {
        self.entries.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn has_active(&self) -> bool {
        self.entries.iter().any(|s| s.is_active())
    }

    pub fn infos(&self) -> Vec<SessionInfo> {
        self.entries.iter().map(ChargingSession::to_info).collect()
    }
}
