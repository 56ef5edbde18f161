//! Persistence for the voltbay station
//!
//! Two things are kept on disk:
//! - the user code set, in a small key/value table
//! - an append-only audit trail of station activity
//!
//! Writes are best effort. Callers keep their in-memory state authoritative
//! and log a failed write instead of failing the operation.

mod audit;
mod sqlite;
mod traits;

pub use audit::*;
pub use sqlite::*;
pub use traits::*;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Stored record could not be encoded or decoded: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("Store connection lock is poisoned")]
    Poisoned,
}

pub type StoreResult<T> = Result<T, StoreError>;
