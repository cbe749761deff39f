//! Board representation: the loop of cells and their ownership state.
//!
//! This module contains:
//! - Identifier and currency aliases shared by the whole engine
//! - Cell kinds and the cell record
//! - The board with lookup and ownership mutation
//!
//! The board performs no economic validation. Whether a purchase, upgrade or
//! sale is legal is decided by the turn engine.

use crate::config::BoardConfig;
use crate::game::GameError;
use serde::{Deserialize, Serialize};

/// Party identifier (0 or 1)
pub type PartyId = u8;

/// Cell identifier, equal to the cell's index on the board
pub type CellId = usize;

/// Signed currency units
pub type Money = i64;

/// What happens when a token lands on a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellKind {
    /// Starting cell; passing it pays salary
    Start,
    /// Land that can be bought, upgraded and charged a toll on
    Ownable,
    /// Draws a random cash event
    Chance,
    /// Flat tax payment
    Tax,
    /// Nothing happens; the turn simply passes
    Rest,
}

impl CellKind {
    pub fn is_ownable(&self) -> bool {
        matches!(self, CellKind::Ownable)
    }
}

/// A single cell on the board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    /// Stable index on the board
    pub id: CellId,
    /// Display label
    pub label: String,
    /// Cell kind
    pub kind: CellKind,
    /// Purchase price (0 for non-ownable cells)
    pub price: Money,
    /// Toll at level 0 (0 for non-ownable cells)
    pub toll: Money,
    /// Improvement level, 0..=3
    pub level: u8,
    /// Current owner, if any
    pub owner: Option<PartyId>,
}

impl Cell {
    /// Create an ownable cell
    pub fn ownable(id: CellId, label: impl Into<String>, price: Money, toll: Money) -> Self {
        Self {
            id,
            label: label.into(),
            kind: CellKind::Ownable,
            price,
            toll,
            level: 0,
            owner: None,
        }
    }

    /// Create a cell of a non-ownable kind
    pub fn special(id: CellId, label: impl Into<String>, kind: CellKind) -> Self {
        Self {
            id,
            label: label.into(),
            kind,
            price: 0,
            toll: 0,
            level: 0,
            owner: None,
        }
    }

    pub fn is_owned(&self) -> bool {
        self.owner.is_some()
    }
}

/// The closed loop of cells
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    cells: Vec<Cell>,
}

impl Board {
    /// Build a board from a list of cells. Cell ids are reassigned to match
    /// their position in the list.
    pub fn new(cells: Vec<Cell>) -> Self {
        let cells = cells
            .into_iter()
            .enumerate()
            .map(|(id, cell)| Cell { id, ..cell })
            .collect();
        Self { cells }
    }

    /// Build a fresh, unowned board from configuration
    pub fn from_config(config: &BoardConfig) -> Self {
        let cells = config
            .cells
            .iter()
            .enumerate()
            .map(|(id, spec)| Cell {
                id,
                label: spec.label.clone(),
                kind: spec.kind,
                price: spec.price,
                toll: spec.toll,
                level: 0,
                owner: None,
            })
            .collect();
        Self { cells }
    }

    /// Number of cells on the loop
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// All cells in board order
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Look up a cell by index
    pub fn cell(&self, id: CellId) -> Result<&Cell, GameError> {
        self.cells.get(id).ok_or(GameError::OutOfRange(id))
    }

    fn cell_mut(&mut self, id: CellId) -> Result<&mut Cell, GameError> {
        self.cells.get_mut(id).ok_or(GameError::OutOfRange(id))
    }

    /// Current owner of a cell
    pub fn owner_of(&self, id: CellId) -> Result<Option<PartyId>, GameError> {
        Ok(self.cell(id)?.owner)
    }

    /// Record `party` as the owner of a cell
    pub fn set_owner(&mut self, id: CellId, party: PartyId) -> Result<(), GameError> {
        self.cell_mut(id)?.owner = Some(party);
        Ok(())
    }

    /// Reset a cell to unowned at level 0
    pub fn clear_ownership(&mut self, id: CellId) -> Result<(), GameError> {
        let cell = self.cell_mut(id)?;
        cell.owner = None;
        cell.level = 0;
        Ok(())
    }

    /// Set the improvement level of a cell
    pub fn set_level(&mut self, id: CellId, level: u8) -> Result<(), GameError> {
        self.cell_mut(id)?.level = level;
        Ok(())
    }

    /// Cells currently owned by a party, in board order
    pub fn owned_by(&self, party: PartyId) -> impl Iterator<Item = &Cell> {
        self.cells
            .iter()
            .filter(move |cell| cell.owner == Some(party))
    }
}
