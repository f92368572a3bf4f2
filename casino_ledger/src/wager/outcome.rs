//! Sources of wager outcomes.

use rand::Rng;
use rust_decimal::Decimal;
use std::collections::VecDeque;
use std::sync::Mutex;

use super::models::{Draw, MIN_MULTIPLIER, Multiplier};
use crate::ledger::AMOUNT_SCALE;

/// Probability of a winning draw
pub const WIN_PROBABILITY: f64 = 0.5;

/// Number of distinct multipliers in `[1, 3)` at 8-decimal resolution
const MULTIPLIER_STEPS: u64 = 200_000_000;

/// Decides win or loss and the payout multiplier for one wager
///
/// Every call must be independent of previous ones.
pub trait OutcomeSource: Send + Sync {
    fn draw(&self) -> Draw;
}

/// Fair coin with a uniform multiplier in `[1, 3)`
///
/// Uses the thread-local generator, which is a CSPRNG reseeded from the OS,
/// so outcomes cannot be predicted from earlier ones.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomOutcome;

impl RandomOutcome {
    pub fn new() -> Self {
        Self
    }
}

impl OutcomeSource for RandomOutcome {
    fn draw(&self) -> Draw {
        let mut rng = rand::rng();
        if !rng.random_bool(WIN_PROBABILITY) {
            return Draw::Lose;
        }

        let step = rng.random_range(0..MULTIPLIER_STEPS);
        let multiplier = MIN_MULTIPLIER + Decimal::from_i128_with_scale(i128::from(step), AMOUNT_SCALE);
        // step < MULTIPLIER_STEPS keeps the value below 3
        Draw::Win {
            multiplier: Multiplier(multiplier),
        }
    }
}

/// Replays a fixed sequence of draws, then loses forever
///
/// Useful for demos and for tests that need a known outcome.
#[derive(Debug, Default)]
pub struct ScriptedOutcome {
    draws: Mutex<VecDeque<Draw>>,
}

impl ScriptedOutcome {
    pub fn new(draws: impl IntoIterator<Item = Draw>) -> Self {
        Self {
            draws: Mutex::new(draws.into_iter().collect()),
        }
    }

    /// Queue another draw
    pub fn push(&self, draw: Draw) {
        if let Ok(mut draws) = self.draws.lock() {
            draws.push_back(draw);
        }
    }
}

impl OutcomeSource for ScriptedOutcome {
    fn draw(&self) -> Draw {
        self.draws
            .lock()
            .ok()
            .and_then(|mut draws| draws.pop_front())
            .unwrap_or(Draw::Lose)
    }
}
