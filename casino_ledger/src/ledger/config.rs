//! Ledger configuration.

use rust_decimal::Decimal;
use std::time::Duration;
use thiserror::Error;

use super::models::validate_starting_amount;

/// Upper bound for a single backoff pause between compare-and-set attempts
pub const MAX_RETRY_BACKOFF: Duration = Duration::from_millis(5);

/// Ledger configuration
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Compare-and-set attempts before giving up with `Contention`
    pub max_cas_attempts: u32,

    /// Base backoff in microseconds, doubled on each conflict and jittered
    pub retry_base_micros: u64,

    /// Balance granted by `open_default_account`
    pub starting_balance: Decimal,
}

impl LedgerConfig {
    /// Create configuration from environment variables
    ///
    /// Expected environment variables:
    /// - `LEDGER_MAX_CAS_ATTEMPTS`: Attempts per mutation (default: 32)
    /// - `LEDGER_RETRY_BASE_MICROS`: Base retry backoff (default: 50)
    /// - `DEFAULT_STARTING_BALANCE`: Provisioning grant (default: 1000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_cas_attempts: std::env::var("LEDGER_MAX_CAS_ATTEMPTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_cas_attempts),
            retry_base_micros: std::env::var("LEDGER_RETRY_BASE_MICROS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.retry_base_micros),
            starting_balance: std::env::var("DEFAULT_STARTING_BALANCE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.starting_balance),
        }
    }

    /// Validate configuration, reporting the first invalid field
    pub fn validate(&self) -> Result<(), LedgerConfigError> {
        if self.max_cas_attempts == 0 {
            return Err(LedgerConfigError::NoCasAttempts);
        }
        validate_starting_amount(self.starting_balance)
            .map_err(|_| LedgerConfigError::InvalidStartingBalance(self.starting_balance))?;
        Ok(())
    }

    /// Backoff before attempt number `attempt` (1-based), without jitter
    pub fn backoff_ceiling(&self, attempt: u32) -> Duration {
        let factor = 1u64 << attempt.min(16);
        Duration::from_micros(self.retry_base_micros.saturating_mul(factor)).min(MAX_RETRY_BACKOFF)
    }
}

/// Ledger configuration errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerConfigError {
    #[error("max_cas_attempts must be at least 1")]
    NoCasAttempts,

    #[error("starting_balance must be non-negative with at most 8 decimals, got {0}")]
    InvalidStartingBalance(Decimal),
}

impl LedgerConfigError {
    /// Environment variable that carries the offending value
    pub fn var(&self) -> &'static str {
        match self {
            LedgerConfigError::NoCasAttempts => "LEDGER_MAX_CAS_ATTEMPTS",
            LedgerConfigError::InvalidStartingBalance(_) => "DEFAULT_STARTING_BALANCE",
        }
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            max_cas_attempts: 32,
            retry_base_micros: 50,
            starting_balance: Decimal::from(1000),
        }
    }
}
