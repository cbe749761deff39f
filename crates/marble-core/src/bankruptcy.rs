//! Bankruptcy detection.
//!
//! A party is bankrupt once its balance is strictly negative after a
//! mandatory charge (toll, tax, chance penalty) and every liquidation option
//! is spent. The engine only calls [`evaluate`] at those points; discretionary
//! spending is always checked for affordability first and cannot go negative.

use crate::board::PartyId;
use crate::game::{GameError, MatchState};
use crate::player::opponent;
use serde::{Deserialize, Serialize};

/// Outcome of a bankruptcy check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Continue,
    GameOver { winner: PartyId },
}

/// Check whether `party` has gone bankrupt
pub fn evaluate(state: &MatchState, party: PartyId) -> Result<Verdict, GameError> {
    if state.party(party)?.cash < 0 {
        Ok(Verdict::GameOver {
            winner: opponent(party),
        })
    } else {
        Ok(Verdict::Continue)
    }
}
