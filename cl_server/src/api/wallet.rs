//! Wallet API handlers.
//!
//! Balance reads, deposits, withdrawals and the transaction history of the
//! user named in the `x-user-id` header.
//!
//! # Examples
//!
//! ```bash
//! curl -X POST http://localhost:6969/api/v1/wallet/deposit \
//!   -H "x-user-id: 7" \
//!   -H "Content-Type: application/json" \
//!   -d '{"amount": "25.50"}'
//! ```

use axum::{
    Json,
    extract::{Extension, State, rejection::JsonRejection},
};
use casino_ledger::{TransactionRecord, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{
    AppState,
    accounts::WalletResponse,
    errors::{ApiError, track},
};

#[derive(Debug, Deserialize)]
pub struct AmountRequest {
    pub amount: Decimal,
}

#[derive(Debug, Serialize)]
pub struct TransactionsResponse {
    pub transactions: Vec<TransactionRecord>,
}

/// Get the caller's wallet.
///
/// # Errors
///
/// - `404 Not Found`: No wallet provisioned
pub async fn get_wallet(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
) -> Result<Json<WalletResponse>, ApiError> {
    let wallet = track("balance", state.ledger.balance(user_id).await)?;
    Ok(Json(WalletResponse {
        message: "Wallet retrieved".to_string(),
        wallet,
    }))
}

/// Credit the caller's wallet.
///
/// # Errors
///
/// - `400 Bad Request`: Amount not positive or malformed
/// - `404 Not Found`: No wallet provisioned
/// - `503 Service Unavailable`: Contention or storage failure, safe to retry
pub async fn deposit(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    payload: Result<Json<AmountRequest>, JsonRejection>,
) -> Result<Json<WalletResponse>, ApiError> {
    let Json(request) = payload?;
    let wallet = track("deposit", state.ledger.deposit(user_id, request.amount).await)?;
    Ok(Json(WalletResponse {
        message: "Deposit successful".to_string(),
        wallet,
    }))
}

/// Debit the caller's wallet.
///
/// # Errors
///
/// - `400 Bad Request`: Amount not positive, malformed, or above the balance
/// - `404 Not Found`: No wallet provisioned
/// - `503 Service Unavailable`: Contention or storage failure, safe to retry
pub async fn withdraw(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    payload: Result<Json<AmountRequest>, JsonRejection>,
) -> Result<Json<WalletResponse>, ApiError> {
    let Json(request) = payload?;
    let wallet = track(
        "withdraw",
        state.ledger.withdraw(user_id, request.amount).await,
    )?;
    Ok(Json(WalletResponse {
        message: "Withdrawal successful".to_string(),
        wallet,
    }))
}

/// List the caller's transactions in application order.
pub async fn list_transactions(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
) -> Result<Json<TransactionsResponse>, ApiError> {
    let transactions = track("transactions", state.ledger.transactions(user_id).await)?;
    Ok(Json(TransactionsResponse { transactions }))
}
