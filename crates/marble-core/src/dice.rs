//! The single source of randomness for a match.
//!
//! Dice rolls, chance-card draws and the automated party's coin flips all go
//! through [`RandomSource`], so a match replays exactly from its seed.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;

/// Every nondeterministic input the engine consumes
pub trait RandomSource {
    /// A die roll in 1..=6
    fn roll_die(&mut self) -> u8;

    /// A uniform index in `0..len`. `len` is never zero.
    fn pick(&mut self, len: usize) -> usize;

    /// `true` with the given probability
    fn chance(&mut self, probability: f64) -> bool;
}

/// Seeded pseudo-random source used in real matches
#[derive(Debug, Clone)]
pub struct SeededRandom {
    rng: StdRng,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for SeededRandom {
    fn roll_die(&mut self) -> u8 {
        self.rng.gen_range(1..=6)
    }

    fn pick(&mut self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        self.rng.gen_range(0..len)
    }

    fn chance(&mut self, probability: f64) -> bool {
        self.rng.gen::<f64>() < probability
    }
}

/// Replays predetermined outcomes.
///
/// Useful for reproducing a reported game or forcing a scenario. When a queue
/// runs dry it falls back to a roll of 1, the first card, and "no".
#[derive(Debug, Clone, Default)]
pub struct ScriptedRandom {
    dice: VecDeque<u8>,
    picks: VecDeque<usize>,
    coins: VecDeque<bool>,
}

impl ScriptedRandom {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dice(mut self, dice: impl IntoIterator<Item = u8>) -> Self {
        self.dice.extend(dice);
        self
    }

    pub fn with_picks(mut self, picks: impl IntoIterator<Item = usize>) -> Self {
        self.picks.extend(picks);
        self
    }

    pub fn with_coins(mut self, coins: impl IntoIterator<Item = bool>) -> Self {
        self.coins.extend(coins);
        self
    }
}

impl RandomSource for ScriptedRandom {
    fn roll_die(&mut self) -> u8 {
        self.dice.pop_front().unwrap_or(1)
    }

    fn pick(&mut self, len: usize) -> usize {
        let index = self.picks.pop_front().unwrap_or(0);
        if len == 0 {
            0
        } else {
            index % len
        }
    }

    fn chance(&mut self, _probability: f64) -> bool {
        self.coins.pop_front().unwrap_or(false)
    }
}
