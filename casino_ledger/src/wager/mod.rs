//! Wager module: fair-coin outcomes settled through the ledger.
//!
//! A wager wins with probability one half. A win draws a payout multiplier
//! uniformly from `[1, 3)` and credits `stake * (multiplier - 1)`; a loss
//! debits the stake. Each settled wager is appended to the game history.
//!
//! ## Example
//!
//! ```
//! use casino_ledger::db::Stores;
//! use casino_ledger::ledger::{Ledger, LedgerConfig};
//! use casino_ledger::wager::{Draw, GameType, ScriptedOutcome, WagerResolver};
//! use rust_decimal::Decimal;
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let stores = Stores::in_memory();
//! let ledger = Arc::new(Ledger::with_config(
//!     stores.accounts,
//!     stores.transactions,
//!     LedgerConfig::default(),
//! ));
//! let resolver = WagerResolver::with_outcomes(
//!     ledger.clone(),
//!     stores.history,
//!     Arc::new(ScriptedOutcome::new([Draw::Lose])),
//! );
//!
//! ledger.open_account(1, Decimal::from(100)).await?;
//! let receipt = resolver.place_wager(1, GameType::Slots, Decimal::from(50)).await?;
//! assert!(!receipt.won());
//! assert_eq!(receipt.balance.amount, Decimal::from(50));
//! # Ok(())
//! # }
//! ```

pub mod models;
pub mod outcome;
pub mod resolver;

pub use models::{
    Draw, GameType, Multiplier, NewWagerOutcome, ParseGameTypeError, WagerOutcome, WagerReceipt,
    WagerStage,
};
pub use outcome::{OutcomeSource, RandomOutcome, ScriptedOutcome};
pub use resolver::{WagerResolver, net_for};
