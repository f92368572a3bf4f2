//! Ledger implementation: version-checked balance mutation paired with audit logging.

use log::{debug, error, info, warn};
use rand::Rng;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;

use super::{
    config::LedgerConfig,
    errors::{LedgerError, LedgerResult, RecordStage},
    models::{
        AMOUNT_SCALE, Balance, NewTransaction, TransactionKind, TransactionRecord, UserId,
        validate_amount, validate_starting_amount,
    },
};
use crate::db::{AccountStore, StoreError, TransactionLog};

/// Outcome of planning a mutation against one balance snapshot
struct Plan {
    new_amount: Decimal,
    kind: TransactionKind,
    amount: Decimal,
}

/// Single choke point for every balance mutation
///
/// Each mutating method reads the balance, validates the change against that
/// snapshot, and writes it back with a compare-and-set on the snapshot's
/// version. A lost race is retried from the read. Only after the write wins
/// is the paired transaction record appended.
#[derive(Clone)]
pub struct Ledger {
    accounts: Arc<dyn AccountStore>,
    transactions: Arc<dyn TransactionLog>,
    config: LedgerConfig,
}

impl Ledger {
    /// Create a new ledger with configuration read from the environment
    ///
    /// # Arguments
    ///
    /// * `accounts` - Balance storage
    /// * `transactions` - Audit log storage
    pub fn new(accounts: Arc<dyn AccountStore>, transactions: Arc<dyn TransactionLog>) -> Self {
        Self::with_config(accounts, transactions, LedgerConfig::from_env())
    }

    /// Create a new ledger with explicit configuration
    pub fn with_config(
        accounts: Arc<dyn AccountStore>,
        transactions: Arc<dyn TransactionLog>,
        config: LedgerConfig,
    ) -> Self {
        Self {
            accounts,
            transactions,
            config,
        }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Provision a balance for a newly registered user
    ///
    /// # Errors
    ///
    /// * `LedgerError::InvalidAmount` - Negative or malformed starting amount
    /// * `LedgerError::AccountExists` - User already has a balance
    pub async fn open_account(
        &self,
        user_id: UserId,
        starting_amount: Decimal,
    ) -> LedgerResult<Balance> {
        let starting_amount = validate_starting_amount(starting_amount)?;
        let balance = self.accounts.create(user_id, starting_amount).await?;
        info!("Opened account for user {user_id} with {starting_amount}");
        Ok(balance)
    }

    /// Provision a balance with the configured starting grant
    pub async fn open_default_account(&self, user_id: UserId) -> LedgerResult<Balance> {
        self.open_account(user_id, self.config.starting_balance)
            .await
    }

    /// Get the current balance for a user
    pub async fn balance(&self, user_id: UserId) -> LedgerResult<Balance> {
        Ok(self.accounts.get(user_id).await?)
    }

    /// Full transaction history for a user, in the order it was applied
    pub async fn transactions(&self, user_id: UserId) -> LedgerResult<Vec<TransactionRecord>> {
        Ok(self.transactions.list_by_user(user_id).await?)
    }

    /// Credit a user's balance
    ///
    /// # Errors
    ///
    /// * `LedgerError::InvalidAmount` - Amount not positive or malformed
    /// * `LedgerError::AccountNotFound` - No balance for the user
    pub async fn deposit(&self, user_id: UserId, amount: Decimal) -> LedgerResult<Balance> {
        let amount = validate_amount(amount)?;
        let (balance, _) = self
            .commit(user_id, |current| {
                let new_amount = current
                    .amount
                    .checked_add(amount)
                    .ok_or(LedgerError::BalanceOverflow)?;
                Ok(Plan {
                    new_amount,
                    kind: TransactionKind::Deposit,
                    amount,
                })
            })
            .await?;
        Ok(balance)
    }

    /// Debit a user's balance
    ///
    /// Sufficiency is checked against the snapshot the compare-and-set is
    /// conditioned on, never against an earlier read.
    ///
    /// # Errors
    ///
    /// * `LedgerError::InvalidAmount` - Amount not positive or malformed
    /// * `LedgerError::AccountNotFound` - No balance for the user
    /// * `LedgerError::InsufficientFunds` - Balance lower than `amount`
    pub async fn withdraw(&self, user_id: UserId, amount: Decimal) -> LedgerResult<Balance> {
        let amount = validate_amount(amount)?;
        let (balance, _) = self
            .commit(user_id, |current| {
                ensure_covered(current, amount)?;
                Ok(Plan {
                    new_amount: current.amount - amount,
                    kind: TransactionKind::Withdraw,
                    amount,
                })
            })
            .await?;
        Ok(balance)
    }

    /// Apply the net result of a resolved wager
    ///
    /// `net` must be `-stake` for a loss or non-negative for a win. A loss is
    /// logged as a `Bet` of `stake`, a win as a `Win` of `net`, so the signed
    /// log always sums to the balance delta.
    ///
    /// # Errors
    ///
    /// * `LedgerError::InvalidAmount` - Bad stake, or `net` neither `-stake` nor `>= 0`
    /// * `LedgerError::AccountNotFound` - No balance for the user
    /// * `LedgerError::InsufficientFunds` - Balance does not cover `stake`
    pub async fn apply_net(
        &self,
        user_id: UserId,
        stake: Decimal,
        net: Decimal,
    ) -> LedgerResult<(Balance, TransactionRecord)> {
        let stake = validate_amount(stake)?;
        let net = net.normalize();
        let is_loss = net == -stake;
        if !is_loss && (net < Decimal::ZERO || net.scale() > AMOUNT_SCALE) {
            return Err(LedgerError::InvalidAmount(net));
        }

        self.commit(user_id, |current| {
            ensure_covered(current, stake)?;
            let new_amount = current
                .amount
                .checked_add(net)
                .ok_or(LedgerError::BalanceOverflow)?;
            let (kind, amount) = if is_loss {
                (TransactionKind::Bet, stake)
            } else {
                (TransactionKind::Win, net)
            };
            Ok(Plan {
                new_amount,
                kind,
                amount,
            })
        })
        .await
    }

    /// Read, plan, compare-and-set, then append the paired record
    ///
    /// A failed read is retryable. A failed compare-and-set other than a
    /// version conflict is not: the write may have committed.
    async fn commit<F>(
        &self,
        user_id: UserId,
        plan: F,
    ) -> LedgerResult<(Balance, TransactionRecord)>
    where
        F: Fn(&Balance) -> LedgerResult<Plan>,
    {
        let max_attempts = self.config.max_cas_attempts.max(1);

        for attempt in 1..=max_attempts {
            let current = self.accounts.get(user_id).await?;
            let Plan {
                new_amount,
                kind,
                amount,
            } = plan(&current)?;

            if new_amount < Decimal::ZERO {
                return Err(LedgerError::InsufficientFunds {
                    available: current.amount,
                    required: current.amount - new_amount,
                });
            }

            match self
                .accounts
                .compare_and_set(user_id, current.version, new_amount)
                .await
            {
                Ok(updated) => {
                    let record = self.record(&updated, kind, amount).await?;
                    return Ok((updated, record));
                }
                Err(StoreError::VersionConflict {
                    expected, actual, ..
                }) => {
                    debug!(
                        "Version conflict for user {user_id} (expected {expected}, found {actual}), attempt {attempt}/{max_attempts}"
                    );
                    if attempt < max_attempts {
                        tokio::time::sleep(self.retry_delay(attempt)).await;
                    }
                }
                Err(StoreError::NotFound(user_id)) => {
                    return Err(LedgerError::AccountNotFound(user_id));
                }
                // The write may have landed before the failure was reported
                Err(source) => {
                    let balance_version = current.version + 1;
                    error!(
                        "RECONCILE: user {user_id} balance write to version {balance_version} ({kind} {amount}) has unknown outcome: {source}"
                    );
                    return Err(LedgerError::Unrecorded {
                        user_id,
                        balance_version,
                        stage: RecordStage::Balance,
                        source,
                    });
                }
            }
        }

        warn!("Giving up on user {user_id} after {max_attempts} conflicting attempts");
        Err(LedgerError::Contention {
            user_id,
            attempts: max_attempts,
        })
    }

    /// Append the audit entry for a committed balance change
    async fn record(
        &self,
        balance: &Balance,
        kind: TransactionKind,
        amount: Decimal,
    ) -> LedgerResult<TransactionRecord> {
        let entry = NewTransaction {
            user_id: balance.user_id,
            kind,
            amount,
            balance_after: balance.amount,
            balance_version: balance.version,
        };

        self.transactions.append(entry).await.map_err(|source| {
            error!(
                "RECONCILE: user {} balance at version {} ({kind} {amount}) has no transaction record: {source}",
                balance.user_id, balance.version
            );
            LedgerError::Unrecorded {
                user_id: balance.user_id,
                balance_version: balance.version,
                stage: RecordStage::TransactionLog,
                source,
            }
        })
    }

    /// Jittered exponential backoff before the next attempt
    fn retry_delay(&self, attempt: u32) -> Duration {
        let ceiling = self.config.backoff_ceiling(attempt).as_micros() as u64;
        if ceiling == 0 {
            return Duration::ZERO;
        }
        Duration::from_micros(rand::rng().random_range(0..=ceiling))
    }
}

fn ensure_covered(current: &Balance, required: Decimal) -> LedgerResult<()> {
    if current.amount < required {
        return Err(LedgerError::InsufficientFunds {
            available: current.amount,
            required,
        });
    }
    Ok(())
}
