//! Account provisioning endpoint.
//!
//! Called by the identity service when a user registers. Creates the user's
//! balance with an explicit starting amount, or the configured default grant.
//!
//! ```bash
//! curl -X POST http://localhost:6969/api/v1/accounts \
//!   -H "Content-Type: application/json" \
//!   -d '{"user_id": 7, "starting_amount": "250"}'
//! ```

use axum::{Json, extract::State, extract::rejection::JsonRejection, http::StatusCode};
use casino_ledger::{Balance, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{
    AppState,
    errors::{ApiError, track},
};

#[derive(Debug, Deserialize)]
pub struct OpenAccountRequest {
    pub user_id: UserId,
    pub starting_amount: Option<Decimal>,
}

#[derive(Debug, Serialize)]
pub struct WalletResponse {
    pub message: String,
    pub wallet: Balance,
}

/// Provision a balance for a new user.
///
/// # Response
///
/// Returns `201 Created` with the new wallet.
///
/// # Errors
///
/// - `400 Bad Request`: Negative or malformed starting amount
/// - `409 Conflict`: User already has a wallet
pub async fn open_account(
    State(state): State<AppState>,
    payload: Result<Json<OpenAccountRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<WalletResponse>), ApiError> {
    let Json(request) = payload?;

    let result = match request.starting_amount {
        Some(amount) => state.ledger.open_account(request.user_id, amount).await,
        None => state.ledger.open_default_account(request.user_id).await,
    };
    let wallet = track("open_account", result)?;

    Ok((
        StatusCode::CREATED,
        Json(WalletResponse {
            message: "Wallet created".to_string(),
            wallet,
        }),
    ))
}
