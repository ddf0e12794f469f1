//! Storage failures.

use thiserror::Error;

/// Errors raised by a store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A persisted row failed to rehydrate into a domain value.
    #[error("corrupt record: {0}")]
    InvalidData(String),

    #[error("schema migration failed: {0}")]
    Migration(String),

    /// A thread panicked while holding the store lock.
    #[error("store lock poisoned")]
    LockPoisoned,

    /// The blocking task running a query failed to complete.
    #[error("blocking task failed: {0}")]
    Task(String),
}

/// Store result.
pub type Result<T> = std::result::Result<T, StoreError>;
