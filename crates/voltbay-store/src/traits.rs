//! Store trait definitions

use crate::{AuditEvent, StoreResult};

/// Main store trait
pub trait Store: Send + Sync {
    // Audit log

    /// Append an audit event
    fn append_audit(&self, event: AuditEvent) -> StoreResult<()>;

    /// Get recent audit events, newest first
    fn get_recent_audits(&self, limit: usize) -> StoreResult<Vec<AuditEvent>>;

    // Key/value

    /// Read the value stored under `key`
    fn get_value(&self, key: &str) -> StoreResult<Option<String>>;

    /// Replace the value stored under `key` (last write wins)
    fn put_value(&self, key: &str, value: &str) -> StoreResult<()>;

    // Health

    /// Check if store is healthy
    fn is_healthy(&self) -> bool;
}
