//! In-memory store implementations.
//!
//! Balances and log sequences sit behind per-user locks inside a shared
//! index. The index write lock is only taken when a user first appears, so
//! mutations and appends for different users never wait on each other.

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::{Mutex, RwLock};

use super::errors::{StoreError, StoreResult};
use super::repository::{AccountStore, GameHistoryStore, TransactionLog};
use crate::ledger::{Balance, NewTransaction, TransactionRecord, UserId};
use crate::wager::{NewWagerOutcome, WagerOutcome};

/// In-memory `AccountStore`
#[derive(Default)]
pub struct MemoryAccountStore {
    balances: RwLock<HashMap<UserId, Arc<Mutex<Balance>>>>,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn entry(&self, user_id: UserId) -> StoreResult<Arc<Mutex<Balance>>> {
        self.balances
            .read()
            .await
            .get(&user_id)
            .cloned()
            .ok_or(StoreError::NotFound(user_id))
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn get(&self, user_id: UserId) -> StoreResult<Balance> {
        let entry = self.entry(user_id).await?;
        let balance = entry.lock().await.clone();
        Ok(balance)
    }

    async fn create(&self, user_id: UserId, starting_amount: Decimal) -> StoreResult<Balance> {
        let mut balances = self.balances.write().await;
        if balances.contains_key(&user_id) {
            return Err(StoreError::AlreadyExists(user_id));
        }

        let now = Utc::now();
        let balance = Balance {
            user_id,
            amount: starting_amount,
            version: 0,
            created_at: now,
            updated_at: now,
        };
        balances.insert(user_id, Arc::new(Mutex::new(balance.clone())));
        Ok(balance)
    }

    async fn compare_and_set(
        &self,
        user_id: UserId,
        expected_version: i64,
        new_amount: Decimal,
    ) -> StoreResult<Balance> {
        let entry = self.entry(user_id).await?;
        let mut balance = entry.lock().await;

        if balance.version != expected_version {
            return Err(StoreError::VersionConflict {
                user_id,
                expected: expected_version,
                actual: balance.version,
            });
        }

        balance.amount = new_amount;
        balance.version += 1;
        balance.updated_at = Utc::now();
        Ok(balance.clone())
    }
}

/// Per-user sequences behind their own locks
///
/// The index write lock is only taken for a user's first entry; appends for
/// different users lock different vectors.
struct PerUser<T> {
    index: RwLock<HashMap<UserId, Arc<Mutex<Vec<T>>>>>,
}

impl<T: Clone> PerUser<T> {
    fn new() -> Self {
        Self {
            index: RwLock::new(HashMap::new()),
        }
    }

    async fn entry(&self, user_id: UserId) -> Arc<Mutex<Vec<T>>> {
        if let Some(entry) = self.index.read().await.get(&user_id) {
            return entry.clone();
        }
        self.index
            .write()
            .await
            .entry(user_id)
            .or_default()
            .clone()
    }

    async fn snapshot(&self, user_id: UserId) -> Vec<T> {
        let entry = self.index.read().await.get(&user_id).cloned();
        match entry {
            Some(entry) => entry.lock().await.clone(),
            None => Vec::new(),
        }
    }
}

/// Insert keeping the per-user sequence ordered by balance version
fn insert_ordered<T>(
    entries: &mut Vec<T>,
    item: T,
    user_id: UserId,
    balance_version: i64,
    version_of: impl Fn(&T) -> i64,
) -> StoreResult<()> {
    let position = entries.partition_point(|e| version_of(e) < balance_version);
    if entries
        .get(position)
        .is_some_and(|e| version_of(e) == balance_version)
    {
        return Err(StoreError::DuplicateEntry {
            user_id,
            balance_version,
        });
    }
    entries.insert(position, item);
    Ok(())
}

/// In-memory `TransactionLog`
pub struct MemoryTransactionLog {
    next_id: AtomicI64,
    entries: PerUser<TransactionRecord>,
}

impl MemoryTransactionLog {
    pub fn new() -> Self {
        Self {
            next_id: AtomicI64::new(1),
            entries: PerUser::new(),
        }
    }
}

impl Default for MemoryTransactionLog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TransactionLog for MemoryTransactionLog {
    async fn append(&self, entry: NewTransaction) -> StoreResult<TransactionRecord> {
        let user_entries = self.entries.entry(entry.user_id).await;
        let mut user_entries = user_entries.lock().await;
        let record = TransactionRecord {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            user_id: entry.user_id,
            kind: entry.kind,
            amount: entry.amount,
            balance_after: entry.balance_after,
            balance_version: entry.balance_version,
            created_at: Utc::now(),
        };

        insert_ordered(
            &mut user_entries,
            record.clone(),
            entry.user_id,
            entry.balance_version,
            |r| r.balance_version,
        )?;
        Ok(record)
    }

    async fn list_by_user(&self, user_id: UserId) -> StoreResult<Vec<TransactionRecord>> {
        Ok(self.entries.snapshot(user_id).await)
    }
}

/// In-memory `GameHistoryStore`
pub struct MemoryGameHistoryStore {
    next_id: AtomicI64,
    outcomes: PerUser<WagerOutcome>,
}

impl MemoryGameHistoryStore {
    pub fn new() -> Self {
        Self {
            next_id: AtomicI64::new(1),
            outcomes: PerUser::new(),
        }
    }
}

impl Default for MemoryGameHistoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GameHistoryStore for MemoryGameHistoryStore {
    async fn append(&self, outcome: NewWagerOutcome) -> StoreResult<WagerOutcome> {
        let user_outcomes = self.outcomes.entry(outcome.user_id).await;
        let mut user_outcomes = user_outcomes.lock().await;
        let record = WagerOutcome {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            user_id: outcome.user_id,
            game_type: outcome.game_type,
            stake: outcome.stake,
            net: outcome.net,
            multiplier: outcome.multiplier,
            transaction_id: outcome.transaction_id,
            balance_version: outcome.balance_version,
            created_at: Utc::now(),
        };

        insert_ordered(
            &mut user_outcomes,
            record.clone(),
            outcome.user_id,
            outcome.balance_version,
            |o| o.balance_version,
        )?;
        Ok(record)
    }

    async fn list_by_user(&self, user_id: UserId) -> StoreResult<Vec<WagerOutcome>> {
        Ok(self.outcomes.snapshot(user_id).await)
    }
}
