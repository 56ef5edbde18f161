//! Time utilities for voltbay
//!
//! Provides both monotonic time (for countdown math) and wall-clock time
//! (for session start metadata and the audit log).
//!
//! # Mock Time for Development
//!
//! In debug builds, the `VOLTBAY_MOCK_TIME` environment variable can be set
//! to override the wall-clock time reported by [`now`]. Monotonic time is
//! never mocked, so countdowns behave the same either way.
//!
//! Format: `YYYY-MM-DD HH:MM:SS` (e.g., `2025-12-25 14:30:00`)

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

/// Environment variable name for mock time (debug builds only)
pub const MOCK_TIME_ENV_VAR: &str = "VOLTBAY_MOCK_TIME";

/// Format accepted by `VOLTBAY_MOCK_TIME`
pub const MOCK_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Offset from real to mock wall-clock time, read once per process
fn mock_offset() -> Option<chrono::Duration> {
    static OFFSET: OnceLock<Option<chrono::Duration>> = OnceLock::new();
    *OFFSET.get_or_init(read_mock_offset)
}

#[cfg(debug_assertions)]
#[allow(clippy::disallowed_methods)]
fn read_mock_offset() -> Option<chrono::Duration> {
    let raw = std::env::var(MOCK_TIME_ENV_VAR).ok()?;
    let Some(mock) = parse_local_time(&raw) else {
        tracing::warn!(
            value = %raw,
            expected_format = MOCK_TIME_FORMAT,
            "Ignoring unparsable mock time"
        );
        return None;
    };
    let offset = mock.signed_duration_since(Local::now());
    tracing::info!(mock_time = %raw, offset_secs = offset.num_seconds(), "Mock time enabled");
    Some(offset)
}

#[cfg(not(debug_assertions))]
fn read_mock_offset() -> Option<chrono::Duration> {
    None
}

/// Parse a `YYYY-MM-DD HH:MM:SS` string as local time.
///
/// Returns `None` for malformed input and for local times that do not exist
/// or are ambiguous (DST transitions).
pub fn parse_local_time(raw: &str) -> Option<DateTime<Local>> {
    let naive = NaiveDateTime::parse_from_str(raw.trim(), MOCK_TIME_FORMAT).ok()?;
    Local.from_local_datetime(&naive).single()
}

/// Whether `VOLTBAY_MOCK_TIME` is in effect
pub fn is_mock_time_active() -> bool {
    mock_offset().is_some()
}

/// Current wall-clock time, shifted by the mock offset in debug builds
#[allow(clippy::disallowed_methods)]
pub fn now() -> DateTime<Local> {
    let real = Local::now();
    mock_offset().map_or(real, |offset| real + offset)
}

/// Format a DateTime for display with full date and time.
pub fn format_datetime_full(dt: &DateTime<Local>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Format a countdown as `MM:SS`, the way the kiosk displays it.
///
/// Minutes are not wrapped into hours: 90 minutes reads `90:00`.
pub fn format_countdown(remaining_seconds: u32) -> String {
    format!("{:02}:{:02}", remaining_seconds / 60, remaining_seconds % 60)
}

/// Represents a point in monotonic time for countdown enforcement.
/// This is immune to wall-clock changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MonotonicInstant(Instant);

impl MonotonicInstant {
    pub fn now() -> Self {
        Self(Instant::now())
    }

    pub fn elapsed(&self) -> Duration {
        self.0.elapsed()
    }

    /// Duration since `earlier`, or zero if `earlier` is actually later
    pub fn duration_since(&self, earlier: MonotonicInstant) -> Duration {
        self.0.saturating_duration_since(earlier.0)
    }

    pub fn checked_add(&self, duration: Duration) -> Option<MonotonicInstant> {
        self.0.checked_add(duration).map(MonotonicInstant)
    }
}

impl From<Instant> for MonotonicInstant {
    fn from(instant: Instant) -> Self {
        Self(instant)
    }
}

impl std::ops::Add<Duration> for MonotonicInstant {
    type Output = MonotonicInstant;

    fn add(self, rhs: Duration) -> Self::Output {
        MonotonicInstant(self.0 + rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone};

    #[test]
    fn test_format_countdown() {
        assert_eq!(format_countdown(0), "00:00");
        assert_eq!(format_countdown(59), "00:59");
        assert_eq!(format_countdown(3590), "59:50");
        assert_eq!(format_countdown(90 * 60), "90:00");
    }

    #[test]
    fn test_monotonic_instant() {
        let t1 = MonotonicInstant::now();
        std::thread::sleep(Duration::from_millis(10));
        let t2 = MonotonicInstant::now();

        assert!(t2 > t1);
        assert!(t2.duration_since(t1) >= Duration::from_millis(10));
        // Reversed order saturates instead of panicking
        assert_eq!(t1.duration_since(t2), Duration::ZERO);
    }

    #[test]
    fn test_monotonic_add() {
        let t1 = MonotonicInstant::now();
        let t2 = t1 + Duration::from_secs(90);
        assert_eq!(t2.duration_since(t1), Duration::from_secs(90));
        assert_eq!(t1.checked_add(Duration::from_secs(90)), Some(t2));
    }

    #[test]
    fn test_format_datetime_full() {
        let dt = Local.with_ymd_and_hms(2025, 12, 25, 14, 30, 45).unwrap();
        assert_eq!(format_datetime_full(&dt), "2025-12-25 14:30:45");
    }

    #[test]
    fn test_parse_local_time() {
        let parsed = parse_local_time(" 2025-12-25 14:30:00 ").unwrap();
        assert_eq!((parsed.month(), parsed.day()), (12, 25));
        assert!(parse_local_time("2025-12-25T14:30:00").is_none());
        assert!(parse_local_time("").is_none());
    }

    #[test]
    fn test_mock_time_resolves() {
        // Read once per process, so only check that it does not panic
        let _ = is_mock_time_active();
    }

    #[test]
    fn test_now_advances() {
        let t1 = now();
        std::thread::sleep(Duration::from_millis(20));
        assert!(now() > t1);
    }
}
