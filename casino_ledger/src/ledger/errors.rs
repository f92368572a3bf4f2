//! Ledger error types.

use rust_decimal::Decimal;
use thiserror::Error;

use super::models::UserId;
use crate::db::StoreError;

/// Store whose write left the balance and its records possibly out of step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordStage {
    /// The compare-and-set itself failed without a definite answer
    Balance,
    TransactionLog,
    GameHistory,
}

impl std::fmt::Display for RecordStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordStage::Balance => write!(f, "balance store"),
            RecordStage::TransactionLog => write!(f, "transaction log"),
            RecordStage::GameHistory => write!(f, "game history"),
        }
    }
}

/// Ledger errors
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Non-positive or malformed amount
    #[error("Invalid amount: {0}")]
    InvalidAmount(Decimal),

    /// No balance provisioned for the user
    #[error("Account not found for user {0}")]
    AccountNotFound(UserId),

    /// Balance already provisioned for the user
    #[error("Account already exists for user {0}")]
    AccountExists(UserId),

    /// Mutation would drive the balance negative
    #[error("Insufficient funds: available {available}, required {required}")]
    InsufficientFunds {
        available: Decimal,
        required: Decimal,
    },

    /// Compare-and-set kept losing to concurrent writers
    #[error("Too much contention on user {user_id} after {attempts} attempts")]
    Contention { user_id: UserId, attempts: u32 },

    /// Balance arithmetic overflowed
    #[error("Balance overflow")]
    BalanceOverflow,

    /// Backing store failed before any state changed
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(#[source] StoreError),

    /// Balance changed, or may have changed, without its audit entry
    ///
    /// `balance_version` is the version the write produced, or would have
    /// produced when the `Balance` stage failed ambiguously.
    #[error(
        "Balance for user {user_id} at version {balance_version} is not recorded, {stage} write failed: {source}"
    )]
    Unrecorded {
        user_id: UserId,
        balance_version: i64,
        stage: RecordStage,
        #[source]
        source: StoreError,
    },
}

/// Category a caller can branch on without inspecting error details
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    InvalidAmount,
    AccountNotFound,
    AccountExists,
    InsufficientFunds,
    Contention,
    StorageUnavailable,
}

impl ErrorCategory {
    /// Stable machine-readable code
    pub fn code(self) -> &'static str {
        match self {
            ErrorCategory::InvalidAmount => "invalid_amount",
            ErrorCategory::AccountNotFound => "account_not_found",
            ErrorCategory::AccountExists => "account_exists",
            ErrorCategory::InsufficientFunds => "insufficient_funds",
            ErrorCategory::Contention => "contention",
            ErrorCategory::StorageUnavailable => "storage_unavailable",
        }
    }
}

impl LedgerError {
    /// Get the error category
    pub fn category(&self) -> ErrorCategory {
        match self {
            LedgerError::InvalidAmount(_) | LedgerError::BalanceOverflow => {
                ErrorCategory::InvalidAmount
            }
            LedgerError::AccountNotFound(_) => ErrorCategory::AccountNotFound,
            LedgerError::AccountExists(_) => ErrorCategory::AccountExists,
            LedgerError::InsufficientFunds { .. } => ErrorCategory::InsufficientFunds,
            LedgerError::Contention { .. } => ErrorCategory::Contention,
            LedgerError::StorageUnavailable(_) | LedgerError::Unrecorded { .. } => {
                ErrorCategory::StorageUnavailable
            }
        }
    }

    /// Whether repeating the same call may succeed
    ///
    /// An `Unrecorded` failure is never retryable: the balance may already have moved.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LedgerError::Contention { .. } | LedgerError::StorageUnavailable(_)
        )
    }

    /// Whether an operator must reconcile the balance against the logs
    pub fn requires_reconciliation(&self) -> bool {
        matches!(self, LedgerError::Unrecorded { .. })
    }

    /// Get a client-safe error message that doesn't leak sensitive information
    ///
    /// Storage errors are sanitized and user IDs are redacted.
    pub fn client_message(&self) -> String {
        match self {
            LedgerError::AccountNotFound(_) => "Account not found".to_string(),
            LedgerError::AccountExists(_) => "Account already exists".to_string(),
            LedgerError::Contention { .. } => {
                "Account is busy, please retry the request".to_string()
            }
            LedgerError::StorageUnavailable(_) => "Storage temporarily unavailable".to_string(),
            LedgerError::Unrecorded { .. } => {
                "Operation requires manual reconciliation, contact support".to_string()
            }
            _ => self.to_string(),
        }
    }
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(user_id) => LedgerError::AccountNotFound(user_id),
            StoreError::AlreadyExists(user_id) => LedgerError::AccountExists(user_id),
            other => LedgerError::StorageUnavailable(other),
        }
    }
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_each_kind_has_distinct_category() {
        let errors = [
            LedgerError::InvalidAmount(dec!(-1)),
            LedgerError::AccountNotFound(7),
            LedgerError::AccountExists(7),
            LedgerError::InsufficientFunds {
                available: dec!(1),
                required: dec!(2),
            },
            LedgerError::Contention {
                user_id: 7,
                attempts: 3,
            },
            LedgerError::StorageUnavailable(StoreError::Unavailable("down".to_string())),
        ];

        let mut codes: Vec<_> = errors.iter().map(|e| e.category().code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_retry_and_reconciliation_flags() {
        let contention = LedgerError::Contention {
            user_id: 1,
            attempts: 8,
        };
        assert!(contention.is_retryable());
        assert!(!contention.requires_reconciliation());

        let unrecorded = LedgerError::Unrecorded {
            user_id: 1,
            balance_version: 4,
            stage: RecordStage::TransactionLog,
            source: StoreError::Unavailable("disk full".to_string()),
        };
        assert!(!unrecorded.is_retryable());
        assert!(unrecorded.requires_reconciliation());
        assert_eq!(unrecorded.category(), ErrorCategory::StorageUnavailable);

        assert!(!LedgerError::InvalidAmount(dec!(0)).is_retryable());
        assert!(!LedgerError::AccountNotFound(1).is_retryable());
    }

    #[test]
    fn test_ambiguous_balance_write_requires_reconciliation() {
        let err = LedgerError::Unrecorded {
            user_id: 1,
            balance_version: 3,
            stage: RecordStage::Balance,
            source: StoreError::Timeout(std::time::Duration::from_secs(5)),
        };
        assert!(!err.is_retryable());
        assert!(err.requires_reconciliation());
        assert!(err.to_string().contains("balance store"));
    }

    #[test]
    fn test_client_message_redacts_details() {
        let err = LedgerError::AccountNotFound(12345);
        assert!(!err.client_message().contains("12345"));

        let err = LedgerError::StorageUnavailable(StoreError::Unavailable(
            "connection refused to 10.0.0.5".to_string(),
        ));
        assert!(!err.client_message().contains("10.0.0.5"));

        let err = LedgerError::InsufficientFunds {
            available: dec!(1000),
            required: dec!(1500),
        };
        assert!(err.client_message().contains("1500"));
    }

    #[test]
    fn test_store_error_conversion() {
        assert!(matches!(
            LedgerError::from(StoreError::NotFound(3)),
            LedgerError::AccountNotFound(3)
        ));
        assert!(matches!(
            LedgerError::from(StoreError::AlreadyExists(3)),
            LedgerError::AccountExists(3)
        ));
        assert!(matches!(
            LedgerError::from(StoreError::Unavailable("x".to_string())),
            LedgerError::StorageUnavailable(_)
        ));
    }
}
