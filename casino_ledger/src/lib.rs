//! # Casino Ledger
//!
//! A consistent monetary ledger for a casino-style wagering service.
//!
//! Every user owns exactly one balance. All mutations go through the
//! [`Ledger`], which validates them against the current balance, writes them
//! with an optimistic compare-and-set on the balance version, and appends one
//! immutable transaction record per successful mutation. Wagers are resolved
//! by the [`WagerResolver`], which settles the net result through the ledger
//! and records the outcome in the game history.
//!
//! ## Guarantees
//!
//! - No balance ever goes negative, even under concurrent mutation
//! - No lost updates: concurrent writers are serialized per user by version
//! - Every applied change has exactly one audit entry, in application order
//!
//! ## Core Modules
//!
//! - [`ledger`]: Balance mutation, validation, retry policy and errors
//! - [`wager`]: Outcome sources and wager settlement
//! - [`db`]: Store traits with in-memory and PostgreSQL backings
//!
//! ## Example
//!
//! ```
//! use casino_ledger::{Ledger, LedgerConfig, Stores};
//! use rust_decimal::Decimal;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), casino_ledger::LedgerError> {
//! let stores = Stores::in_memory();
//! let ledger = Ledger::with_config(stores.accounts, stores.transactions, LedgerConfig::default());
//!
//! ledger.open_account(42, Decimal::from(100)).await?;
//! ledger.withdraw(42, Decimal::from(30)).await?;
//! assert_eq!(ledger.balance(42).await?.amount, Decimal::from(70));
//! # Ok(())
//! # }
//! ```

/// Storage traits and backings.
pub mod db;
pub use db::{Database, DatabaseConfig, StoreError, Stores};

/// Balance ledger.
pub mod ledger;
pub use ledger::{
    Balance, ErrorCategory, Ledger, LedgerConfig, LedgerError, LedgerResult, TransactionKind,
    TransactionRecord, UserId,
};

/// Wager resolution.
pub mod wager;
pub use wager::{Draw, GameType, OutcomeSource, WagerOutcome, WagerReceipt, WagerResolver};
