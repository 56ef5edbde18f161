//! Raw configuration schema (as parsed from TOML)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw configuration as parsed from TOML
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawConfig {
    /// Config schema version
    pub config_version: u32,

    /// Station-level settings
    #[serde(default)]
    pub station: RawStationConfig,

    /// Admin code and the initial user code set
    #[serde(default)]
    pub codes: RawCodes,

    /// Allowed session lengths
    #[serde(default)]
    pub durations: Option<RawDurations>,
}

/// Station-level settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawStationConfig {
    /// Display name of the bay
    pub name: Option<String>,

    /// Data directory for the store
    pub data_dir: Option<PathBuf>,

    /// Countdown tick period in milliseconds (default: 1000)
    pub tick_interval_ms: Option<u64>,

    /// How remaining time is computed
    #[serde(default)]
    pub countdown: Option<CountdownPolicy>,
}

/// Code configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawCodes {
    /// Fixed admin code (default: "9999")
    pub admin_code: Option<String>,

    /// User codes used when the store holds no saved set
    pub default_user_codes: Option<Vec<String>>,
}

/// Session lengths in minutes.
///
/// Signed so that a negative value reaches validation instead of failing
/// as an opaque parse error.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawDurations {
    pub short: i64,
    pub medium: i64,
    pub long: i64,
}

/// How the countdown advances
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CountdownPolicy {
    /// Subtract one second per tick. A missed tick is a lost second, so the
    /// display can lag behind real time if the process is suspended.
    #[default]
    PerTick,

    /// Recompute from the monotonic time elapsed since the session started.
    WallClock,
}
