//! Game API handlers.
//!
//! ```bash
//! curl -X POST http://localhost:6969/api/v1/games/bet \
//!   -H "x-user-id: 7" \
//!   -H "Content-Type: application/json" \
//!   -d '{"game_type": "slots", "bet_amount": "50"}'
//! ```

use axum::{
    Json,
    extract::{Extension, State, rejection::JsonRejection},
};
use casino_ledger::{Balance, GameType, TransactionRecord, UserId, WagerOutcome};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::{
    AppState,
    errors::{ApiError, track},
    request_id::RequestId,
};
use crate::{logging, metrics};

#[derive(Debug, Deserialize)]
pub struct BetRequest {
    pub game_type: String,
    pub bet_amount: Decimal,
}

#[derive(Debug, Serialize)]
pub struct BetResponse {
    pub message: String,
    pub won: bool,
    pub game_result: WagerOutcome,
    pub wallet: Balance,
    pub transaction: TransactionRecord,
}

#[derive(Debug, Serialize)]
pub struct GameHistoryResponse {
    pub game_history: Vec<WagerOutcome>,
}

/// Place a wager and settle it immediately.
///
/// # Response
///
/// Returns `200 OK` with the recorded game result and the updated wallet.
///
/// # Errors
///
/// - `400 Bad Request`: Unknown game type, bad stake, or stake above the balance
/// - `404 Not Found`: No wallet provisioned
/// - `500 Internal Server Error`: Wallet settled but the result was not recorded
pub async fn place_bet(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    Extension(request_id): Extension<RequestId>,
    payload: Result<Json<BetRequest>, JsonRejection>,
) -> Result<Json<BetResponse>, ApiError> {
    let Json(request) = payload?;
    let game_type = request
        .game_type
        .parse::<GameType>()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let started = Instant::now();
    let receipt = track(
        "place_wager",
        state
            .resolver
            .place_wager(user_id, game_type, request.bet_amount)
            .await,
    )?;
    logging::log_performance(
        "place_wager",
        started.elapsed().as_millis() as u64,
        Some(request_id.as_str()),
    );

    let won = receipt.won();
    metrics::wagers_total(&game_type.to_string(), won);

    let message = if won {
        "Congratulations! You won!"
    } else {
        "Better luck next time!"
    };

    Ok(Json(BetResponse {
        message: message.to_string(),
        won,
        game_result: receipt.outcome,
        wallet: receipt.balance,
        transaction: receipt.transaction,
    }))
}

/// List the caller's settled wagers.
pub async fn game_history(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
) -> Result<Json<GameHistoryResponse>, ApiError> {
    let game_history = track("game_history", state.resolver.history(user_id).await)?;
    Ok(Json(GameHistoryResponse { game_history }))
}
