//! Actions parties can take, the choice points that suspend a turn, and the
//! events and snapshots produced while resolving turns.

use crate::board::{CellId, Money, PartyId};
use serde::{Deserialize, Serialize};

/// All possible actions a party can submit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameAction {
    /// Roll the die (start of turn)
    RollDice,
    /// Answer the pending choice point
    Answer(Answer),
}

/// An answer from the deciding party to a suspended turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Answer {
    /// Accept or decline a purchase or upgrade offer
    YesNo(bool),
    /// Cells to sell toward a pending obligation. Empty means abandon.
    Liquidate(Vec<CellId>),
}

/// A discretionary offer awaiting a yes/no
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Choice {
    /// Buy the unowned cell just landed on
    Purchase { cell: CellId, price: Money },
    /// Improve an owned cell to the next level
    Upgrade {
        cell: CellId,
        cost: Money,
        next_level: u8,
    },
}

impl Choice {
    pub fn cell(&self) -> CellId {
        match self {
            Choice::Purchase { cell, .. } | Choice::Upgrade { cell, .. } => *cell,
        }
    }

    pub fn cost(&self) -> Money {
        match self {
            Choice::Purchase { price, .. } => *price,
            Choice::Upgrade { cost, .. } => *cost,
        }
    }
}

/// A payment that forced a liquidation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Obligation {
    /// Discretionary: abandoning cancels the upgrade
    Upgrade { cell: CellId },
    /// Mandatory: failing to cover it means bankruptcy
    Toll { cell: CellId, owner: PartyId },
}

impl Obligation {
    pub fn is_mandatory(&self) -> bool {
        matches!(self, Obligation::Toll { .. })
    }

    /// A cell that may not be sold to cover this obligation
    pub fn protected_cell(&self) -> Option<CellId> {
        match self {
            Obligation::Upgrade { cell } => Some(*cell),
            Obligation::Toll { .. } => None,
        }
    }
}

/// A party short of funds for an obligation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidationRequest {
    /// Party that owes
    pub debtor: PartyId,
    /// Full amount of the obligation
    pub amount: Money,
    pub obligation: Obligation,
}

/// An owned cell offered for sale, with what it would fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidationCandidate {
    pub cell: CellId,
    pub level: u8,
    pub value: Money,
}

/// What the deferred decision source is currently being asked
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PendingDecision {
    YesNo(Choice),
    Liquidation {
        request: LiquidationRequest,
        candidates: Vec<LiquidationCandidate>,
        /// Cash still missing
        deficit: Money,
    },
}

/// Coarse category used by the presentation layer to style narration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventCategory {
    Default,
    Golden,
    Tax,
    Island,
    GameOver,
}

/// Events that occur while resolving a turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    DiceRolled {
        party: PartyId,
        roll: u32,
    },

    Moved {
        party: PartyId,
        from: usize,
        to: usize,
    },

    /// Salary for passing the start cell
    SalaryPaid {
        party: PartyId,
        amount: Money,
    },

    Landed {
        party: PartyId,
        cell: CellId,
    },

    /// The engine is waiting on the deferred decision source
    DecisionRequired {
        party: PartyId,
    },

    PropertyPurchased {
        party: PartyId,
        cell: CellId,
        price: Money,
    },

    PurchaseDeclined {
        party: PartyId,
        cell: CellId,
    },

    /// Not enough cash to buy; no liquidation is offered for purchases
    PurchaseUnaffordable {
        party: PartyId,
        cell: CellId,
    },

    PropertyUpgraded {
        party: PartyId,
        cell: CellId,
        level: u8,
        cost: Money,
    },

    UpgradeDeclined {
        party: PartyId,
        cell: CellId,
    },

    /// Funds could not be raised for an upgrade
    UpgradeAbandoned {
        party: PartyId,
        cell: CellId,
    },

    /// Landed on an own cell that is already fully improved
    MaxLevelReached {
        party: PartyId,
        cell: CellId,
    },

    /// A party must sell cells before paying
    LiquidationRequired {
        party: PartyId,
        amount: Money,
        deficit: Money,
    },

    PropertySold {
        party: PartyId,
        cell: CellId,
        value: Money,
    },

    TollPaid {
        payer: PartyId,
        owner: PartyId,
        cell: CellId,
        amount: Money,
    },

    ChanceDrawn {
        party: PartyId,
        label: String,
        delta: Money,
    },

    TaxPaid {
        party: PartyId,
        amount: Money,
    },

    Rested {
        party: PartyId,
    },

    Bankrupt {
        party: PartyId,
        cash: Money,
    },

    TurnEnded {
        party: PartyId,
        next_party: PartyId,
    },

    /// The winner's standing when the match ended
    GameWon {
        party: PartyId,
        cash: Money,
        properties: usize,
    },
}

impl GameEvent {
    pub fn category(&self) -> EventCategory {
        match self {
            GameEvent::ChanceDrawn { .. } => EventCategory::Golden,
            GameEvent::TaxPaid { .. } | GameEvent::TollPaid { .. } => EventCategory::Tax,
            GameEvent::Rested { .. } => EventCategory::Island,
            GameEvent::Bankrupt { .. } | GameEvent::GameWon { .. } => EventCategory::GameOver,
            _ => EventCategory::Default,
        }
    }
}

/// Summary of how a turn's landing resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Effect {
    /// Nothing changed hands
    None,
    Purchased { price: Money },
    Declined,
    Upgraded { level: u8, cost: Money },
    TollPaid { owner: PartyId, amount: Money },
    Chance { delta: Money },
    Tax { amount: Money },
    Rested,
    Bankrupt { winner: PartyId },
}

/// Serializable record of one finished turn, for replication
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnSnapshot {
    pub turn: u32,
    pub acting_party: PartyId,
    pub roll: u32,
    pub landed_cell: CellId,
    pub effect: Effect,
    /// Cash of both parties after the turn
    pub cash: [Money; 2],
}
