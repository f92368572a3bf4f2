//! Wager resolution: draw an outcome, settle it through the ledger, record it.

use log::{debug, error};
use rust_decimal::{Decimal, RoundingStrategy};
use std::sync::Arc;

use super::{
    models::{Draw, GameType, NewWagerOutcome, WagerOutcome, WagerReceipt, WagerStage},
    outcome::{OutcomeSource, RandomOutcome},
};
use crate::db::GameHistoryStore;
use crate::ledger::{
    AMOUNT_SCALE, Ledger, LedgerError, LedgerResult, RecordStage, UserId, validate_amount,
};

/// Net balance change for a stake and draw
///
/// A loss forfeits the stake. A win pays `stake * (multiplier - 1)` as profit,
/// truncated to the ledger's precision; the stake itself stays with the user.
pub fn net_for(stake: Decimal, draw: Draw) -> Decimal {
    match draw {
        Draw::Lose => -stake,
        Draw::Win { multiplier } => (stake * (multiplier.get() - Decimal::ONE))
            .round_dp_with_strategy(AMOUNT_SCALE, RoundingStrategy::ToZero)
            .normalize(),
    }
}

/// Resolves wagers against the ledger
#[derive(Clone)]
pub struct WagerResolver {
    ledger: Arc<Ledger>,
    history: Arc<dyn GameHistoryStore>,
    outcomes: Arc<dyn OutcomeSource>,
}

impl WagerResolver {
    /// Create a resolver drawing from [`RandomOutcome`]
    pub fn new(ledger: Arc<Ledger>, history: Arc<dyn GameHistoryStore>) -> Self {
        Self::with_outcomes(ledger, history, Arc::new(RandomOutcome::new()))
    }

    /// Create a resolver with an explicit outcome source
    pub fn with_outcomes(
        ledger: Arc<Ledger>,
        history: Arc<dyn GameHistoryStore>,
        outcomes: Arc<dyn OutcomeSource>,
    ) -> Self {
        Self {
            ledger,
            history,
            outcomes,
        }
    }

    pub fn ledger(&self) -> &Arc<Ledger> {
        &self.ledger
    }

    /// Place and settle a wager
    ///
    /// # Arguments
    ///
    /// * `user_id` - User placing the wager
    /// * `game_type` - Game the wager is placed on
    /// * `stake` - Amount at risk
    ///
    /// # Returns
    ///
    /// * `LedgerResult<WagerReceipt>` - Recorded outcome, new balance and paired transaction
    ///
    /// # Errors
    ///
    /// * `LedgerError::InvalidAmount` - Stake not positive or malformed
    /// * `LedgerError::AccountNotFound` - No balance for the user
    /// * `LedgerError::InsufficientFunds` - Balance does not cover the stake
    /// * `LedgerError::Unrecorded` - Balance settled, or may have, but was not fully recorded
    pub async fn place_wager(
        &self,
        user_id: UserId,
        game_type: GameType,
        stake: Decimal,
    ) -> LedgerResult<WagerReceipt> {
        debug!("Wager for user {user_id} on {game_type}: {}", WagerStage::Requested);

        let stake = validate_amount(stake).inspect_err(|_| {
            debug!("Wager for user {user_id}: {}", WagerStage::Rejected);
        })?;
        debug!("Wager for user {user_id}: {}", WagerStage::Validated);

        let draw = self.outcomes.draw();
        let net = net_for(stake, draw);

        let (balance, transaction) = self
            .ledger
            .apply_net(user_id, stake, net)
            .await
            .inspect_err(|e| {
                debug!(
                    "Wager for user {user_id}: {} ({e})",
                    WagerStage::after_failure(e)
                );
            })?;
        debug!(
            "Wager for user {user_id}: {} at version {}",
            WagerStage::BalanceApplied,
            balance.version
        );

        let outcome = self
            .history
            .append(NewWagerOutcome {
                user_id,
                game_type,
                stake,
                net,
                multiplier: draw.multiplier(),
                transaction_id: transaction.id,
                balance_version: balance.version,
            })
            .await
            .map_err(|source| {
                error!(
                    "RECONCILE: user {user_id} wager settled at version {} (net {net}) has no game history: {source}",
                    balance.version
                );
                debug!("Wager for user {user_id}: {}", WagerStage::Unreconciled);
                LedgerError::Unrecorded {
                    user_id,
                    balance_version: balance.version,
                    stage: RecordStage::GameHistory,
                    source,
                }
            })?;
        debug!("Wager for user {user_id}: {}", WagerStage::Recorded);

        Ok(WagerReceipt {
            outcome,
            balance,
            transaction,
        })
    }

    /// Full wager history for a user, in the order it was settled
    pub async fn history(&self, user_id: UserId) -> LedgerResult<Vec<WagerOutcome>> {
        Ok(self.history.list_by_user(user_id).await?)
    }
}
