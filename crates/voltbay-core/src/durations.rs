//! Admin-configurable session lengths

use tracing::info;
use voltbay_api::ChargeDurations;
use voltbay_util::{Result, StationError};

/// Holds the `{short, medium, long}` triple offered on the duration picker
#[derive(Debug, Clone, Default)]
pub struct DurationConfig {
    current: ChargeDurations,
}

impl DurationConfig {
    pub fn new(initial: ChargeDurations) -> Result<Self> {
        validate_durations(&initial)?;
        Ok(Self { current: initial })
    }

    pub fn get(&self) -> ChargeDurations {
        self.current
    }

    /// Replace the whole triple. Nothing changes unless every field is valid.
    pub fn set(&mut self, durations: ChargeDurations) -> Result<()> {
        validate_durations(&durations)?;
        self.current = durations;
        info!(
            short = durations.short,
            medium = durations.medium,
            long = durations.long,
            "Charge durations updated"
        );
        Ok(())
    }
}

fn validate_durations(durations: &ChargeDurations) -> Result<()> {
    for (slot, minutes) in durations.options() {
        if minutes == 0 {
            return Err(StationError::config(format!(
                "{:?} duration must be a positive number of minutes",
                slot
            )));
        }
    }
    Ok(())
}
