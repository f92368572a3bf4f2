//! Wager data models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

use crate::ledger::{Balance, LedgerError, TransactionRecord, UserId};

/// Lowest win multiplier (inclusive)
pub const MIN_MULTIPLIER: Decimal = Decimal::ONE;

/// Highest win multiplier (exclusive)
pub const MAX_MULTIPLIER: Decimal = Decimal::from_parts(3, 0, 0, false, 0);

/// Game a wager was placed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameType {
    Slots,
    Poker,
    Roulette,
    Blackjack,
    Sports,
}

impl std::fmt::Display for GameType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameType::Slots => write!(f, "slots"),
            GameType::Poker => write!(f, "poker"),
            GameType::Roulette => write!(f, "roulette"),
            GameType::Blackjack => write!(f, "blackjack"),
            GameType::Sports => write!(f, "sports"),
        }
    }
}

/// Unknown game type name
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown game type: {0}")]
pub struct ParseGameTypeError(pub String);

impl FromStr for GameType {
    type Err = ParseGameTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "slot" | "slots" => Ok(GameType::Slots),
            "poker" => Ok(GameType::Poker),
            "roulette" => Ok(GameType::Roulette),
            "blackjack" => Ok(GameType::Blackjack),
            "sports" => Ok(GameType::Sports),
            _ => Err(ParseGameTypeError(s.to_string())),
        }
    }
}

/// Win multiplier, always within `[1, 3)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Multiplier(pub(super) Decimal);

impl Multiplier {
    /// `None` unless `value` lies in `[1, 3)`
    pub fn new(value: Decimal) -> Option<Self> {
        (MIN_MULTIPLIER..MAX_MULTIPLIER)
            .contains(&value)
            .then_some(Self(value))
    }

    pub fn get(self) -> Decimal {
        self.0
    }
}

/// Result of the random draw for one wager
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Draw {
    Lose,
    Win { multiplier: Multiplier },
}

impl Draw {
    /// Build a winning draw, `None` unless `multiplier` lies in `[1, 3)`
    pub fn win(multiplier: Decimal) -> Option<Self> {
        Multiplier::new(multiplier).map(|multiplier| Draw::Win { multiplier })
    }

    pub fn multiplier(&self) -> Option<Decimal> {
        match self {
            Draw::Lose => None,
            Draw::Win { multiplier } => Some(multiplier.get()),
        }
    }
}

/// Lifecycle of a single wager
///
/// `Requested -> Validated -> BalanceApplied -> Recorded` on success,
/// `Requested -> Rejected` when nothing was mutated. `Unreconciled` marks a
/// failure after the balance moved, or may have moved, without its records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WagerStage {
    Requested,
    Validated,
    BalanceApplied,
    Recorded,
    Rejected,
    Unreconciled,
}

impl WagerStage {
    /// Terminal stage for a wager that failed with `err`
    pub fn after_failure(err: &LedgerError) -> Self {
        if err.requires_reconciliation() {
            WagerStage::Unreconciled
        } else {
            WagerStage::Rejected
        }
    }
}

impl std::fmt::Display for WagerStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WagerStage::Requested => write!(f, "requested"),
            WagerStage::Validated => write!(f, "validated"),
            WagerStage::BalanceApplied => write!(f, "balance_applied"),
            WagerStage::Recorded => write!(f, "recorded"),
            WagerStage::Rejected => write!(f, "rejected"),
            WagerStage::Unreconciled => write!(f, "unreconciled"),
        }
    }
}

/// Immutable record of a resolved wager
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WagerOutcome {
    pub id: i64,
    pub user_id: UserId,
    pub game_type: GameType,
    pub stake: Decimal,
    /// Negative stake on a loss, profit on a win
    pub net: Decimal,
    /// Drawn multiplier on a win
    ///
    /// `net` is `stake * (multiplier - 1)` truncated toward zero to 8
    /// decimals, so for small stakes it can fall below the exact product.
    pub multiplier: Option<Decimal>,
    pub transaction_id: i64,
    pub balance_version: i64,
    pub created_at: DateTime<Utc>,
}

impl WagerOutcome {
    pub fn won(&self) -> bool {
        self.net >= Decimal::ZERO
    }
}

/// Wager outcome before the history store assigns its id and timestamp
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWagerOutcome {
    pub user_id: UserId,
    pub game_type: GameType,
    pub stake: Decimal,
    pub net: Decimal,
    pub multiplier: Option<Decimal>,
    pub transaction_id: i64,
    pub balance_version: i64,
}

/// Everything produced by a successfully placed wager
#[derive(Debug, Clone, Serialize)]
pub struct WagerReceipt {
    pub outcome: WagerOutcome,
    pub balance: Balance,
    pub transaction: TransactionRecord,
}

impl WagerReceipt {
    pub fn won(&self) -> bool {
        self.outcome.won()
    }
}
