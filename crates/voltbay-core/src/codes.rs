//! The station code book: one fixed admin code and an ordered user code set

use std::sync::Arc;
use tracing::{debug, info, warn};
use voltbay_store::Store;
use voltbay_util::{AccessCode, Result, StationError};

/// Store key holding the user code set as a JSON array of strings
pub const USER_CODES_KEY: &str = "user_codes";

/// Admin code plus the persisted, ordered set of user codes.
///
/// The admin code is never a member of the user set and is never written
/// to the store.
pub struct CodeBook {
    admin_code: AccessCode,
    user_codes: Vec<AccessCode>,
    store: Arc<dyn Store>,
}

impl CodeBook {
    /// Load the user code set from the store.
    ///
    /// Falls back to `defaults` when nothing is stored or the stored value
    /// cannot be parsed. Stored entries that are malformed, duplicated or
    /// equal to the admin code are dropped.
    pub fn load(admin_code: AccessCode, defaults: &[AccessCode], store: Arc<dyn Store>) -> Self {
        let stored = match store.get_value(USER_CODES_KEY) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "Failed to read user codes, using defaults");
                None
            }
        };

        let loaded = stored.and_then(|json| match serde_json::from_str::<Vec<String>>(&json) {
            Ok(raw) => Some(raw),
            Err(e) => {
                warn!(error = %e, "Stored user codes are unparsable, using defaults");
                None
            }
        });

        let mut book = Self {
            admin_code,
            user_codes: Vec::new(),
            store,
        };

        match loaded {
            Some(raw) => {
                let total = raw.len();
                for code in raw {
                    match AccessCode::parse(&code) {
                        Ok(code) if book.accepts(&code) => book.user_codes.push(code),
                        _ => {}
                    }
                }
                let dropped = total - book.user_codes.len();
                if dropped > 0 {
                    warn!(dropped, "Ignored invalid entries in stored user codes");
                }
                info!(count = book.user_codes.len(), "User codes loaded from store");
            }
            None => {
                for code in defaults {
                    if book.accepts(code) {
                        book.user_codes.push(code.clone());
                    }
                }
                info!(count = book.user_codes.len(), "Using default user codes");
            }
        }

        book
    }

    /// Whether `code` could join the user set right now
    fn accepts(&self, code: &AccessCode) -> bool {
        *code != self.admin_code && !self.user_codes.contains(code)
    }

    /// Whether the presented keypad entry is the admin code
    pub fn is_admin(&self, presented: &str) -> bool {
        self.admin_code.matches(presented)
    }

    /// 0-based position of the presented entry in the user set
    pub fn position_of(&self, presented: &str) -> Option<usize> {
        self.user_codes.iter().position(|c| c.matches(presented))
    }

    /// Number of user codes
    pub fn len(&self) -> usize {
        self.user_codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.user_codes.is_empty()
    }

    /// Copy of the user codes in their current order
    pub fn user_codes(&self) -> Vec<String> {
        self.user_codes.iter().map(|c| c.as_str().to_string()).collect()
    }

    /// Append a user code and persist the set.
    ///
    /// Returns the 1-based position of the new code.
    pub fn add_user_code(&mut self, code: &str) -> Result<usize> {
        let code = AccessCode::parse(code)?;
        if !self.accepts(&code) {
            return Err(StationError::DuplicateCode);
        }

        self.user_codes.push(code);
        self.persist();

        let position = self.user_codes.len();
        info!(position, "User code added");
        Ok(position)
    }

    /// Remove a user code and persist the set.
    ///
    /// Removing a code that is not present is not an error; the return value
    /// tells whether anything was removed.
    pub fn remove_user_code(&mut self, code: &str) -> Result<bool> {
        if self.is_admin(code) {
            return Err(StationError::AdminCodeImmutable);
        }

        let before = self.user_codes.len();
        self.user_codes.retain(|c| !c.matches(code));
        let removed = self.user_codes.len() != before;

        self.persist();

        if removed {
            info!(count = self.user_codes.len(), "User code removed");
        } else {
            debug!("Remove requested for unknown user code");
        }
        Ok(removed)
    }

    /// Rewrite the full set. Best effort: a failed write is logged and the
    /// in-memory set stays authoritative.
    fn persist(&self) {
        let json = match serde_json::to_string(&self.user_codes) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "Failed to serialize user codes");
                return;
            }
        };

        if let Err(e) = self.store.put_value(USER_CODES_KEY, &json) {
            warn!(error = %e, "Failed to persist user codes");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voltbay_store::SqliteStore;

    fn code(s: &str) -> AccessCode {
        AccessCode::parse(s).unwrap()
    }

    fn defaults() -> Vec<AccessCode> {
        (1001..=1010).map(|n| code(&n.to_string())).collect()
    }

    fn make_book(store: Arc<dyn Store>) -> CodeBook {
        CodeBook::load(code("9999"), &defaults(), store)
    }

    #[test]
    fn loads_defaults_when_store_is_empty() {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let book = make_book(store.clone());

        assert_eq!(book.len(), 10);
        assert_eq!(book.user_codes()[0], "1001");
        assert_eq!(book.user_codes()[9], "1010");
        // Loading alone does not write anything
        assert!(store.get_value(USER_CODES_KEY).unwrap().is_none());
    }

    #[test]
    fn loads_defaults_when_store_is_unparsable() {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        store.put_value(USER_CODES_KEY, "{not json").unwrap();

        let book = make_book(store);
        assert_eq!(book.len(), 10);
    }

    #[test]
    fn stored_set_is_sanitized() {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        store
            .put_value(USER_CODES_KEY, r#"["2002","9999","2002","12","3003"]"#)
            .unwrap();

        let book = make_book(store);
        assert_eq!(book.user_codes(), vec!["2002", "3003"]);
    }

    #[test]
    fn add_user_code_rules() {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let mut book = make_book(store.clone());

        assert_eq!(book.add_user_code("99999"), Err(StationError::InvalidFormat));
        assert_eq!(book.add_user_code("9999"), Err(StationError::DuplicateCode));
        assert_eq!(book.add_user_code("1005"), Err(StationError::DuplicateCode));
        assert_eq!(book.len(), 10);

        assert_eq!(book.add_user_code("2002"), Ok(11));
        assert!(book.user_codes().contains(&"2002".to_string()));
        assert_eq!(book.add_user_code("2002"), Err(StationError::DuplicateCode));

        let stored: Vec<String> =
            serde_json::from_str(&store.get_value(USER_CODES_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(stored.len(), 11);
        assert_eq!(stored.last().map(String::as_str), Some("2002"));
    }

    #[test]
    fn remove_user_code_rules() {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let mut book = make_book(store.clone());

        assert_eq!(book.remove_user_code("9999"), Err(StationError::AdminCodeImmutable));
        assert_eq!(book.remove_user_code("1003"), Ok(true));
        assert_eq!(book.position_of("1004"), Some(2));
        assert_eq!(book.remove_user_code("1003"), Ok(false));
        assert_eq!(book.len(), 9);

        let stored: Vec<String> =
            serde_json::from_str(&store.get_value(USER_CODES_KEY).unwrap().unwrap()).unwrap();
        assert!(!stored.contains(&"1003".to_string()));
    }

    #[test]
    fn user_codes_is_a_copy() {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let book = make_book(store);

        let mut copy = book.user_codes();
        copy.clear();
        assert_eq!(book.len(), 10);
    }

    #[test]
    fn persisted_set_is_reloaded() {
        let store: Arc<dyn Store> = Arc::new(SqliteStore::in_memory().unwrap());
        {
            let mut book = make_book(store.clone());
            book.add_user_code("4444").unwrap();
            book.remove_user_code("1001").unwrap();
        }

        let book = make_book(store);
        assert_eq!(book.len(), 10);
        assert_eq!(book.position_of("1001"), None);
        assert_eq!(book.position_of("4444"), Some(9));
    }
}
