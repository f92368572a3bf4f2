//! Storage error types.

use crate::ledger::UserId;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by the account, transaction and game history stores
#[derive(Debug, Error)]
pub enum StoreError {
    /// No balance exists for the user
    #[error("Balance not found for user {0}")]
    NotFound(UserId),

    /// A balance already exists for the user
    #[error("Balance already exists for user {0}")]
    AlreadyExists(UserId),

    /// Stored version differs from the expected one
    #[error("Version conflict for user {user_id}: expected {expected}, found {actual}")]
    VersionConflict {
        user_id: UserId,
        expected: i64,
        actual: i64,
    },

    /// An entry for this balance version was already appended
    #[error("Entry for user {user_id} at balance version {balance_version} already exists")]
    DuplicateEntry {
        user_id: UserId,
        balance_version: i64,
    },

    /// Query exceeded its deadline
    #[error("Storage operation timed out after {0:?}")]
    Timeout(Duration),

    /// Backing store cannot serve the request
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
