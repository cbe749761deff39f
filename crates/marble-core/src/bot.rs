//! Decision policy for the automated opponent.
//!
//! The bot is a simple stochastic player: it buys affordable land with a fixed
//! probability and upgrades with another. Liquidation is not discretionary, so
//! the bot never decides whether to sell; the engine runs the greedy policy in
//! [`crate::liquidation`] for it.

use crate::actions::Choice;
use crate::config::Rules;
use crate::dice::RandomSource;
use serde::{Deserialize, Serialize};

/// The automated decision source
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bot {
    pub buy_probability: f64,
    pub upgrade_probability: f64,
}

impl Bot {
    pub fn new(buy_probability: f64, upgrade_probability: f64) -> Self {
        Self {
            buy_probability,
            upgrade_probability,
        }
    }

    pub fn from_rules(rules: &Rules) -> Self {
        Self::new(rules.buy_probability, rules.upgrade_probability)
    }

    /// Answer a yes/no offer. Affordability has already been checked by the
    /// engine; only the coin flip happens here.
    pub fn decide<R: RandomSource + ?Sized>(&self, choice: &Choice, rng: &mut R) -> bool {
        match choice {
            Choice::Purchase { .. } => rng.chance(self.buy_probability),
            Choice::Upgrade { .. } => rng.chance(self.upgrade_probability),
        }
    }
}

impl Default for Bot {
    fn default() -> Self {
        Self::from_rules(&Rules::default())
    }
}
