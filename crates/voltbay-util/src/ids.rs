//! Strongly-typed identifiers for voltbay

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::StationError;

/// Stable identity derived from a successful authentication.
///
/// This is the roster key. It is never shown to people directly; the
/// presentation layer uses the label that travels next to it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Identity(String);

impl Identity {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Identity of the station administrator
    pub fn admin() -> Self {
        Self("admin".to_string())
    }

    /// Identity of the user code at 1-based `position` in the code set
    pub fn user(position: usize) -> Self {
        Self(format!("user-{}", position))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for Identity {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Identity {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Unique identifier for one charging session
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Number of digits in every access code
pub const ACCESS_CODE_LEN: usize = 4;

/// A 4-digit shared secret typed on the station keypad.
///
/// Only constructible through [`AccessCode::parse`], so holding one means the
/// format has already been checked. `Debug` is redacted.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccessCode(String);

impl AccessCode {
    /// Parse a code, accepting exactly four ASCII digits
    pub fn parse(code: &str) -> Result<Self, StationError> {
        if is_well_formed(code) {
            Ok(Self(code.to_string()))
        } else {
            Err(StationError::InvalidFormat)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Compare against a raw keypad entry
    pub fn matches(&self, presented: &str) -> bool {
        self.0 == presented
    }
}

/// Check the `^\d{4}$` shape without allocating
pub fn is_well_formed(code: &str) -> bool {
    code.len() == ACCESS_CODE_LEN && code.bytes().all(|b| b.is_ascii_digit())
}

impl fmt::Debug for AccessCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessCode(****)")
    }
}

impl TryFrom<String> for AccessCode {
    type Error = StationError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<AccessCode> for String {
    fn from(code: AccessCode) -> Self {
        code.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_derivation() {
        assert_eq!(Identity::admin().as_str(), "admin");
        assert_eq!(Identity::user(1).as_str(), "user-1");
        assert_eq!(Identity::user(10).as_str(), "user-10");
        assert!(Identity::new("  ").is_empty());
    }

    #[test]
    fn session_id_uniqueness() {
        let s1 = SessionId::new();
        let s2 = SessionId::new();
        assert_ne!(s1, s2);
    }

    #[test]
    fn access_code_format() {
        assert!(AccessCode::parse("1001").is_ok());
        assert!(AccessCode::parse("0000").is_ok());
        assert_eq!(AccessCode::parse("99999"), Err(StationError::InvalidFormat));
        assert_eq!(AccessCode::parse("999"), Err(StationError::InvalidFormat));
        assert_eq!(AccessCode::parse("12a4"), Err(StationError::InvalidFormat));
        assert_eq!(AccessCode::parse(" 123"), Err(StationError::InvalidFormat));
        // Non-ASCII digits are rejected even though they are numeric
        assert_eq!(AccessCode::parse("١٢٣٤"), Err(StationError::InvalidFormat));
    }

    #[test]
    fn access_code_debug_is_redacted() {
        let code = AccessCode::parse("4321").unwrap();
        assert!(!format!("{:?}", code).contains("4321"));
    }

    #[test]
    fn access_code_serde_validates() {
        let json = serde_json::to_string(&AccessCode::parse("1234").unwrap()).unwrap();
        assert_eq!(json, "\"1234\"");

        let parsed: AccessCode = serde_json::from_str("\"5678\"").unwrap();
        assert!(parsed.matches("5678"));

        assert!(serde_json::from_str::<AccessCode>("\"12345\"").is_err());
    }
}
