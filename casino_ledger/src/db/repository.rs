//! Store trait definitions for testability and dependency injection.
//!
//! The ledger and wager resolver only see these traits, so any backing that
//! honors the contracts below can be plugged in.

use async_trait::async_trait;
use rust_decimal::Decimal;

use super::errors::StoreResult;
use crate::ledger::{Balance, NewTransaction, TransactionRecord, UserId};
use crate::wager::{NewWagerOutcome, WagerOutcome};

/// Keyed storage for one balance per user
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Get the balance for a user
    ///
    /// # Errors
    ///
    /// * `StoreError::NotFound` - No balance exists
    async fn get(&self, user_id: UserId) -> StoreResult<Balance>;

    /// Create a balance at version 0
    ///
    /// The caller guarantees `starting_amount >= 0`.
    ///
    /// # Errors
    ///
    /// * `StoreError::AlreadyExists` - A balance already exists
    async fn create(&self, user_id: UserId, starting_amount: Decimal) -> StoreResult<Balance>;

    /// Replace the amount only if the stored version equals `expected_version`
    ///
    /// On success the version is incremented by one.
    ///
    /// # Errors
    ///
    /// * `StoreError::VersionConflict` - Stored version moved on
    /// * `StoreError::NotFound` - No balance exists
    async fn compare_and_set(
        &self,
        user_id: UserId,
        expected_version: i64,
        new_amount: Decimal,
    ) -> StoreResult<Balance>;
}

/// Append-only ledger of completed monetary events
#[async_trait]
pub trait TransactionLog: Send + Sync {
    /// Append a record, assigning a monotonically increasing id
    ///
    /// # Errors
    ///
    /// * `StoreError::DuplicateEntry` - `(user_id, balance_version)` already logged
    async fn append(&self, entry: NewTransaction) -> StoreResult<TransactionRecord>;

    /// Full history of a user ordered by balance version
    async fn list_by_user(&self, user_id: UserId) -> StoreResult<Vec<TransactionRecord>>;
}

/// Append-only record of resolved wagers
#[async_trait]
pub trait GameHistoryStore: Send + Sync {
    /// Append an outcome, assigning a monotonically increasing id
    async fn append(&self, outcome: NewWagerOutcome) -> StoreResult<WagerOutcome>;

    /// Full wager history of a user ordered by balance version
    async fn list_by_user(&self, user_id: UserId) -> StoreResult<Vec<WagerOutcome>>;
}
