//! Party state: cash, holdings, position and who makes its decisions.

use crate::board::{CellId, Money, PartyId};
use serde::{Deserialize, Serialize};

/// Who answers a party's discretionary choices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Controller {
    /// A human; the engine suspends until an answer is supplied
    Deferred,
    /// The built-in stochastic opponent; choices resolve immediately
    Automated,
}

/// One of the two participants
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
    /// Party ID (0 or 1)
    pub id: PartyId,
    /// Display name
    pub name: String,
    /// Cash balance; negative only once the party is bankrupt
    pub cash: Money,
    /// Owned cells in acquisition order
    pub owned: Vec<CellId>,
    /// Index of the cell the token stands on
    pub position: usize,
    /// Decision source for this party
    pub controller: Controller,
}

impl Party {
    /// Create a party at the start cell
    pub fn new(id: PartyId, name: String, cash: Money, controller: Controller) -> Self {
        Self {
            id,
            name,
            cash,
            owned: Vec::new(),
            position: 0,
            controller,
        }
    }

    pub fn can_afford(&self, amount: Money) -> bool {
        self.cash >= amount
    }

    /// How much is still missing to pay `amount`
    pub fn deficit(&self, amount: Money) -> Money {
        (amount - self.cash).max(0)
    }

    pub fn owns(&self, cell: CellId) -> bool {
        self.owned.contains(&cell)
    }

    pub fn is_automated(&self) -> bool {
        self.controller == Controller::Automated
    }

    pub(crate) fn acquire(&mut self, cell: CellId) {
        if !self.owns(cell) {
            self.owned.push(cell);
        }
    }

    pub(crate) fn release(&mut self, cell: CellId) {
        self.owned.retain(|&c| c != cell);
    }
}

/// The other participant
pub fn opponent(party: PartyId) -> PartyId {
    1 - (party & 1)
}
