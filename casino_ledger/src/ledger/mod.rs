//! Ledger module: one balance per user, mutated only together with an audit entry.
//!
//! This module implements:
//! - Version-checked balance updates with bounded, jittered retries
//! - Exactly one append-only transaction record per successful mutation
//! - Deposit, withdraw and wager settlement (`apply_net`)
//! - Account provisioning with a configurable starting grant
//!
//! ## Example
//!
//! ```
//! use casino_ledger::db::Stores;
//! use casino_ledger::ledger::{Ledger, LedgerConfig};
//! use rust_decimal::Decimal;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let stores = Stores::in_memory();
//! let ledger = Ledger::with_config(stores.accounts, stores.transactions, LedgerConfig::default());
//!
//! ledger.open_account(1, Decimal::from(100)).await?;
//! let balance = ledger.deposit(1, Decimal::from(25)).await?;
//! assert_eq!(balance.amount, Decimal::from(125));
//! assert_eq!(ledger.transactions(1).await?.len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod errors;
pub mod manager;
pub mod models;

pub use config::{LedgerConfig, LedgerConfigError};
pub use errors::{ErrorCategory, LedgerError, LedgerResult, RecordStage};
pub use manager::Ledger;
pub use models::{
    AMOUNT_SCALE, Balance, NewTransaction, TransactionKind, TransactionRecord, UserId,
    validate_amount,
};
