//! Configuration validation

use crate::schema::{CountdownPolicy, RawCodes, RawConfig, RawDurations, RawStationConfig};
use crate::station::DEFAULT_TICK_INTERVAL;
use std::collections::HashSet;
use thiserror::Error;
use voltbay_util::is_well_formed;

/// Validation error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: code must be exactly 4 digits")]
    MalformedCode { field: String },

    #[error("codes.default_user_codes[{index}]: duplicate code")]
    DuplicateUserCode { index: usize },

    #[error("codes.default_user_codes[{index}]: equals the admin code")]
    AdminCodeInUserCodes { index: usize },

    #[error("durations.{slot}: must be a positive number of minutes, got {value}")]
    InvalidDuration { slot: &'static str, value: i64 },

    #[error("station.tick_interval_ms: must be greater than zero")]
    InvalidTickInterval,

    #[error(
        "station.tick_interval_ms: per_tick countdown takes one second per tick, got {interval_ms} ms"
    )]
    PerTickIntervalMismatch { interval_ms: u64 },

    #[error("station.name: cannot be empty")]
    EmptyStationName,
}

/// Validate a raw configuration, collecting every problem
pub fn validate_config(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    errors.extend(validate_station(&config.station));
    errors.extend(validate_codes(&config.codes));
    if let Some(durations) = &config.durations {
        errors.extend(validate_durations(durations));
    }

    errors
}

fn validate_station(station: &RawStationConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if let Some(name) = &station.name
        && name.trim().is_empty()
    {
        errors.push(ValidationError::EmptyStationName);
    }

    match station.tick_interval_ms {
        Some(0) => errors.push(ValidationError::InvalidTickInterval),
        Some(interval_ms)
            if station.countdown.unwrap_or_default() == CountdownPolicy::PerTick
                && u128::from(interval_ms) != DEFAULT_TICK_INTERVAL.as_millis() =>
        {
            errors.push(ValidationError::PerTickIntervalMismatch { interval_ms });
        }
        _ => {}
    }

    errors
}

fn validate_codes(codes: &RawCodes) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if let Some(admin) = &codes.admin_code
        && !is_well_formed(admin)
    {
        errors.push(ValidationError::MalformedCode {
            field: "codes.admin_code".into(),
        });
    }

    let admin = codes
        .admin_code
        .as_deref()
        .unwrap_or(crate::DEFAULT_ADMIN_CODE);

    if let Some(user_codes) = &codes.default_user_codes {
        let mut seen = HashSet::new();
        for (index, code) in user_codes.iter().enumerate() {
            if !is_well_formed(code) {
                errors.push(ValidationError::MalformedCode {
                    field: format!("codes.default_user_codes[{}]", index),
                });
            } else if code == admin {
                errors.push(ValidationError::AdminCodeInUserCodes { index });
            } else if !seen.insert(code.as_str()) {
                errors.push(ValidationError::DuplicateUserCode { index });
            }
        }
    }

    errors
}

/// Check the duration triple
pub fn validate_durations(durations: &RawDurations) -> Vec<ValidationError> {
    [
        ("short", durations.short),
        ("medium", durations.medium),
        ("long", durations.long),
    ]
    .into_iter()
    .filter(|(_, value)| *value <= 0 || u32::try_from(*value).is_err())
    .map(|(slot, value)| ValidationError::InvalidDuration { slot, value })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(codes: RawCodes, durations: Option<RawDurations>) -> RawConfig {
        RawConfig {
            config_version: 1,
            station: RawStationConfig::default(),
            codes,
            durations,
        }
    }

    #[test]
    fn empty_config_is_valid() {
        assert!(validate_config(&raw(RawCodes::default(), None)).is_empty());
    }

    #[test]
    fn malformed_admin_code() {
        let codes = RawCodes {
            admin_code: Some("12345".into()),
            default_user_codes: None,
        };
        let errors = validate_config(&raw(codes, None));
        assert_eq!(
            errors,
            vec![ValidationError::MalformedCode {
                field: "codes.admin_code".into()
            }]
        );
    }

    #[test]
    fn user_code_problems_are_all_reported() {
        let codes = RawCodes {
            admin_code: None,
            default_user_codes: Some(vec![
                "1001".into(),
                "1001".into(),
                "9999".into(),
                "10a1".into(),
            ]),
        };
        let errors = validate_config(&raw(codes, None));
        assert_eq!(
            errors,
            vec![
                ValidationError::DuplicateUserCode { index: 1 },
                ValidationError::AdminCodeInUserCodes { index: 2 },
                ValidationError::MalformedCode {
                    field: "codes.default_user_codes[3]".into()
                },
            ]
        );
    }

    #[test]
    fn custom_admin_code_frees_the_default() {
        let codes = RawCodes {
            admin_code: Some("4242".into()),
            default_user_codes: Some(vec!["9999".into(), "4242".into()]),
        };
        let errors = validate_config(&raw(codes, None));
        assert_eq!(errors, vec![ValidationError::AdminCodeInUserCodes { index: 1 }]);
    }

    #[test]
    fn non_positive_durations() {
        let durations = RawDurations {
            short: 0,
            medium: -5,
            long: 90,
        };
        let errors = validate_config(&raw(RawCodes::default(), Some(durations)));
        assert_eq!(
            errors,
            vec![
                ValidationError::InvalidDuration { slot: "short", value: 0 },
                ValidationError::InvalidDuration { slot: "medium", value: -5 },
            ]
        );
    }

    #[test]
    fn zero_tick_interval() {
        let mut config = raw(RawCodes::default(), None);
        config.station = RawStationConfig {
            name: Some("Bay 1".into()),
            data_dir: None,
            tick_interval_ms: Some(0),
            countdown: Some(CountdownPolicy::WallClock),
        };
        assert_eq!(
            validate_config(&config),
            vec![ValidationError::InvalidTickInterval]
        );
    }

    #[test]
    fn per_tick_needs_one_second_interval() {
        let mut config = raw(RawCodes::default(), None);
        config.station.tick_interval_ms = Some(500);
        assert_eq!(
            validate_config(&config),
            vec![ValidationError::PerTickIntervalMismatch { interval_ms: 500 }]
        );

        config.station.countdown = Some(CountdownPolicy::PerTick);
        config.station.tick_interval_ms = Some(1000);
        assert!(validate_config(&config).is_empty());

        config.station.countdown = Some(CountdownPolicy::WallClock);
        config.station.tick_interval_ms = Some(500);
        assert!(validate_config(&config).is_empty());
    }
}
