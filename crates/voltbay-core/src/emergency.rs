//! Global emergency latch

use chrono::{DateTime, Local};

/// Once tripped, suppresses all session activity until explicitly reset.
#[derive(Debug, Default, Clone)]
pub struct EmergencyLatch {
    tripped_at: Option<DateTime<Local>>,
}

impl EmergencyLatch {
    pub fn is_tripped(&self) -> bool {
        self.tripped_at.is_some()
    }

    pub fn tripped_at(&self) -> Option<DateTime<Local>> {
        self.tripped_at
    }

    /// Trip the latch. Returns false if it was already tripped.
    pub fn trip(&mut self, now: DateTime<Local>) -> bool {
        if self.is_tripped() {
            return false;
        }
        self.tripped_at = Some(now);
        true
    }

    /// Release the latch. Returns false if it was not tripped.
    pub fn reset(&mut self) -> bool {
        self.tripped_at.take().is_some()
    }
}
