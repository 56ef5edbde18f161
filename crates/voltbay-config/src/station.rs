//! Validated station configuration

use crate::schema::{CountdownPolicy, RawConfig, RawStationConfig};
use std::path::PathBuf;
use std::time::Duration;
use voltbay_api::ChargeDurations;
use voltbay_util::{AccessCode, default_data_dir};

/// Admin code used when the config does not name one
pub const DEFAULT_ADMIN_CODE: &str = "9999";

/// User codes used when neither the store nor the config provides a set
pub const DEFAULT_USER_CODES: [&str; 10] = [
    "1001", "1002", "1003", "1004", "1005", "1006", "1007", "1008", "1009", "1010",
];

/// Default countdown tick period
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Validated configuration ready for use by the station core
#[derive(Debug, Clone)]
pub struct StationConfig {
    pub station: StationSettings,

    /// Fixed admin code; never persisted
    pub admin_code: AccessCode,

    /// Fallback user code set
    pub default_user_codes: Vec<AccessCode>,

    /// Initial session lengths
    pub durations: ChargeDurations,
}

impl StationConfig {
    /// Convert from raw config (after validation)
    pub fn from_raw(raw: RawConfig) -> Self {
        let admin_code = raw
            .codes
            .admin_code
            .as_deref()
            .and_then(|c| AccessCode::parse(c).ok())
            .unwrap_or_else(default_admin_code);

        let default_user_codes = match raw.codes.default_user_codes {
            Some(codes) => codes
                .iter()
                .filter_map(|c| AccessCode::parse(c).ok())
                .collect(),
            None => builtin_user_codes(),
        };

        // Validation has already rejected non-positive values
        let durations = raw
            .durations
            .map(|d| {
                ChargeDurations::new(
                    u32::try_from(d.short).unwrap_or(ChargeDurations::DEFAULT_SHORT),
                    u32::try_from(d.medium).unwrap_or(ChargeDurations::DEFAULT_MEDIUM),
                    u32::try_from(d.long).unwrap_or(ChargeDurations::DEFAULT_LONG),
                )
            })
            .unwrap_or_default();

        Self {
            station: StationSettings::from_raw(raw.station),
            admin_code,
            default_user_codes,
            durations,
        }
    }
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            station: StationSettings::default(),
            admin_code: default_admin_code(),
            default_user_codes: builtin_user_codes(),
            durations: ChargeDurations::default(),
        }
    }
}

/// Station-level settings
#[derive(Debug, Clone)]
pub struct StationSettings {
    pub name: String,
    pub data_dir: PathBuf,
    pub tick_interval: Duration,
    pub countdown: CountdownPolicy,
}

impl StationSettings {
    fn from_raw(raw: RawStationConfig) -> Self {
        Self {
            name: raw.name.unwrap_or_else(|| "Charging Station".into()),
            data_dir: raw.data_dir.unwrap_or_else(default_data_dir),
            tick_interval: raw
                .tick_interval_ms
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_TICK_INTERVAL),
            countdown: raw.countdown.unwrap_or_default(),
        }
    }
}

impl Default for StationSettings {
    fn default() -> Self {
        Self::from_raw(RawStationConfig::default())
    }
}

fn default_admin_code() -> AccessCode {
    AccessCode::parse(DEFAULT_ADMIN_CODE).expect("built-in admin code is 4 digits")
}

/// The built-in `1001..1010` user code set
pub fn builtin_user_codes() -> Vec<AccessCode> {
    DEFAULT_USER_CODES
        .iter()
        .filter_map(|c| AccessCode::parse(c).ok())
        .collect()
}
