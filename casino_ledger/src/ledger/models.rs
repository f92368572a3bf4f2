//! Ledger data models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::errors::{LedgerError, LedgerResult};

/// User ID type
pub type UserId = i64;

/// Number of fractional digits an amount may carry
pub const AMOUNT_SCALE: u32 = 8;

/// Balance held for a single user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub user_id: UserId,
    pub amount: Decimal,
    /// Incremented by one on every successful compare-and-set
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Kind of a completed monetary event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Deposit,
    Withdraw,
    Bet,
    Win,
}

impl TransactionKind {
    /// Signed balance effect of a record of this kind with the given magnitude
    pub fn signed(self, amount: Decimal) -> Decimal {
        match self {
            TransactionKind::Deposit | TransactionKind::Win => amount,
            TransactionKind::Withdraw | TransactionKind::Bet => -amount,
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionKind::Deposit => write!(f, "deposit"),
            TransactionKind::Withdraw => write!(f, "withdraw"),
            TransactionKind::Bet => write!(f, "bet"),
            TransactionKind::Win => write!(f, "win"),
        }
    }
}

impl FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deposit" => Ok(TransactionKind::Deposit),
            "withdraw" => Ok(TransactionKind::Withdraw),
            "bet" => Ok(TransactionKind::Bet),
            "win" => Ok(TransactionKind::Win),
            other => Err(format!("unknown transaction kind: {other}")),
        }
    }
}

/// Immutable audit entry paired with one balance mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: i64,
    pub user_id: UserId,
    pub kind: TransactionKind,
    /// Magnitude only, the sign comes from `kind`
    pub amount: Decimal,
    pub balance_after: Decimal,
    /// Balance version produced by the paired mutation
    pub balance_version: i64,
    pub created_at: DateTime<Utc>,
}

impl TransactionRecord {
    /// Signed effect this record had on the balance
    pub fn signed_amount(&self) -> Decimal {
        self.kind.signed(self.amount)
    }
}

/// Transaction record before the log assigns its id and timestamp
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    pub user_id: UserId,
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub balance_after: Decimal,
    pub balance_version: i64,
}

/// Check that an amount is strictly positive and carries at most [`AMOUNT_SCALE`] decimals.
///
/// Returns the normalized amount.
pub fn validate_amount(amount: Decimal) -> LedgerResult<Decimal> {
    let normalized = amount.normalize();
    if normalized <= Decimal::ZERO || normalized.scale() > AMOUNT_SCALE {
        return Err(LedgerError::InvalidAmount(amount));
    }
    Ok(normalized)
}

/// Like [`validate_amount`], but zero is accepted.
pub fn validate_starting_amount(amount: Decimal) -> LedgerResult<Decimal> {
    if amount.is_zero() {
        return Ok(Decimal::ZERO);
    }
    validate_amount(amount)
}
