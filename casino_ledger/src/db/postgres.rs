//! PostgreSQL store implementations.
#![allow(clippy::needless_raw_string_hashes)]

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{PgPool, Row, postgres::PgRow};

use super::errors::{StoreError, StoreResult};
use super::repository::{AccountStore, GameHistoryStore, TransactionLog};
use super::timeouts::with_default_timeout;
use crate::ledger::{Balance, NewTransaction, TransactionKind, TransactionRecord, UserId};
use crate::wager::{GameType, NewWagerOutcome, WagerOutcome};

/// Postgres unique-violation SQLSTATE
const UNIQUE_VIOLATION: &str = "23505";

fn balance_from_row(row: &PgRow) -> Balance {
    Balance {
        user_id: row.get("user_id"),
        amount: row.get("amount"),
        version: row.get("version"),
        created_at: row.get::<chrono::NaiveDateTime, _>("created_at").and_utc(),
        updated_at: row.get::<chrono::NaiveDateTime, _>("updated_at").and_utc(),
    }
}

fn transaction_from_row(row: &PgRow) -> StoreResult<TransactionRecord> {
    let kind = row
        .get::<String, _>("kind")
        .parse::<TransactionKind>()
        .map_err(StoreError::Unavailable)?;

    Ok(TransactionRecord {
        id: row.get("id"),
        user_id: row.get("user_id"),
        kind,
        amount: row.get("amount"),
        balance_after: row.get("balance_after"),
        balance_version: row.get("balance_version"),
        created_at: row.get::<chrono::NaiveDateTime, _>("created_at").and_utc(),
    })
}

fn outcome_from_row(row: &PgRow) -> StoreResult<WagerOutcome> {
    let game_type = row
        .get::<String, _>("game_type")
        .parse::<GameType>()
        .map_err(|e| StoreError::Unavailable(e.to_string()))?;

    Ok(WagerOutcome {
        id: row.get("id"),
        user_id: row.get("user_id"),
        game_type,
        stake: row.get("stake"),
        net: row.get("net"),
        multiplier: row.get("multiplier"),
        transaction_id: row.get("transaction_id"),
        balance_version: row.get("balance_version"),
        created_at: row.get::<chrono::NaiveDateTime, _>("created_at").and_utc(),
    })
}

fn is_unique_violation(err: &StoreError) -> bool {
    match err {
        StoreError::Database(sqlx::Error::Database(db)) => {
            db.code().as_deref() == Some(UNIQUE_VIOLATION)
        }
        _ => false,
    }
}

/// PostgreSQL implementation of `AccountStore`
#[derive(Clone)]
pub struct PgAccountStore {
    pool: PgPool,
}

impl PgAccountStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountStore for PgAccountStore {
    async fn get(&self, user_id: UserId) -> StoreResult<Balance> {
        let row = with_default_timeout(
            sqlx::query(
                "SELECT user_id, amount, version, created_at, updated_at
                 FROM balances
                 WHERE user_id = $1",
            )
            .bind(user_id)
            .fetch_optional(&self.pool),
        )
        .await?
        .ok_or(StoreError::NotFound(user_id))?;

        Ok(balance_from_row(&row))
    }

    async fn create(&self, user_id: UserId, starting_amount: Decimal) -> StoreResult<Balance> {
        let row = with_default_timeout(
            sqlx::query(
                "INSERT INTO balances (user_id, amount, version)
                 VALUES ($1, $2, 0)
                 ON CONFLICT (user_id) DO NOTHING
                 RETURNING user_id, amount, version, created_at, updated_at",
            )
            .bind(user_id)
            .bind(starting_amount)
            .fetch_optional(&self.pool),
        )
        .await?
        .ok_or(StoreError::AlreadyExists(user_id))?;

        Ok(balance_from_row(&row))
    }

    async fn compare_and_set(
        &self,
        user_id: UserId,
        expected_version: i64,
        new_amount: Decimal,
    ) -> StoreResult<Balance> {
        // Version check and write happen in one statement
        let updated = with_default_timeout(
            sqlx::query(
                "UPDATE balances
                 SET amount = $1, version = version + 1, updated_at = NOW()
                 WHERE user_id = $2 AND version = $3
                 RETURNING user_id, amount, version, created_at, updated_at",
            )
            .bind(new_amount)
            .bind(user_id)
            .bind(expected_version)
            .fetch_optional(&self.pool),
        )
        .await?;

        if let Some(row) = updated {
            return Ok(balance_from_row(&row));
        }

        // Either the balance doesn't exist or the version moved on
        let current = with_default_timeout(
            sqlx::query("SELECT version FROM balances WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool),
        )
        .await?;

        match current {
            Some(row) => Err(StoreError::VersionConflict {
                user_id,
                expected: expected_version,
                actual: row.get("version"),
            }),
            None => Err(StoreError::NotFound(user_id)),
        }
    }
}

/// PostgreSQL implementation of `TransactionLog`
#[derive(Clone)]
pub struct PgTransactionLog {
    pool: PgPool,
}

impl PgTransactionLog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionLog for PgTransactionLog {
    async fn append(&self, entry: NewTransaction) -> StoreResult<TransactionRecord> {
        let result = with_default_timeout(
            sqlx::query(
                r#"
                INSERT INTO ledger_transactions (user_id, kind, amount, balance_after, balance_version)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id, user_id, kind, amount, balance_after, balance_version, created_at
                "#,
            )
            .bind(entry.user_id)
            .bind(entry.kind.to_string())
            .bind(entry.amount)
            .bind(entry.balance_after)
            .bind(entry.balance_version)
            .fetch_one(&self.pool),
        )
        .await;

        match result {
            Ok(row) => transaction_from_row(&row),
            Err(err) if is_unique_violation(&err) => Err(StoreError::DuplicateEntry {
                user_id: entry.user_id,
                balance_version: entry.balance_version,
            }),
            Err(err) => Err(err),
        }
    }

    async fn list_by_user(&self, user_id: UserId) -> StoreResult<Vec<TransactionRecord>> {
        let rows = with_default_timeout(
            sqlx::query(
                r#"
                SELECT id, user_id, kind, amount, balance_after, balance_version, created_at
                FROM ledger_transactions
                WHERE user_id = $1
                ORDER BY balance_version ASC
                "#,
            )
            .bind(user_id)
            .fetch_all(&self.pool),
        )
        .await?;

        rows.iter().map(transaction_from_row).collect()
    }
}

/// PostgreSQL implementation of `GameHistoryStore`
#[derive(Clone)]
pub struct PgGameHistoryStore {
    pool: PgPool,
}

impl PgGameHistoryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GameHistoryStore for PgGameHistoryStore {
    async fn append(&self, outcome: NewWagerOutcome) -> StoreResult<WagerOutcome> {
        let result = with_default_timeout(
            sqlx::query(
                r#"
                INSERT INTO wager_outcomes
                    (user_id, game_type, stake, net, multiplier, transaction_id, balance_version)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING id, user_id, game_type, stake, net, multiplier, transaction_id,
                          balance_version, created_at
                "#,
            )
            .bind(outcome.user_id)
            .bind(outcome.game_type.to_string())
            .bind(outcome.stake)
            .bind(outcome.net)
            .bind(outcome.multiplier)
            .bind(outcome.transaction_id)
            .bind(outcome.balance_version)
            .fetch_one(&self.pool),
        )
        .await;

        match result {
            Ok(row) => outcome_from_row(&row),
            Err(err) if is_unique_violation(&err) => Err(StoreError::DuplicateEntry {
                user_id: outcome.user_id,
                balance_version: outcome.balance_version,
            }),
            Err(err) => Err(err),
        }
    }

    async fn list_by_user(&self, user_id: UserId) -> StoreResult<Vec<WagerOutcome>> {
        let rows = with_default_timeout(
            sqlx::query(
                r#"
                SELECT id, user_id, game_type, stake, net, multiplier, transaction_id,
                       balance_version, created_at
                FROM wager_outcomes
                WHERE user_id = $1
                ORDER BY balance_version ASC
                "#,
            )
            .bind(user_id)
            .fetch_all(&self.pool),
        )
        .await?;

        rows.iter().map(outcome_from_row).collect()
    }
}
