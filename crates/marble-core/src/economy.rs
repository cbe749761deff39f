//! Pure economy rules: upgrade costs, tolls, sale values and salary.
//!
//! All arithmetic is integer; percentages round down.

use crate::board::{Board, Cell, Money, PartyId};

/// Highest improvement level a cell can reach
pub const MAX_LEVEL: u8 = 3;

/// Upgrade cost as a percentage of the base price
const UPGRADE_COST_PERCENT: Money = 50;

/// Sale value as a percentage of everything sunk into a cell
const LIQUIDATION_PERCENT: Money = 70;

/// Price of buying an unowned cell
pub fn purchase_price(cell: &Cell) -> Money {
    cell.price
}

/// Cost of one upgrade step. Every step costs the same.
pub fn upgrade_cost(cell: &Cell) -> Money {
    cell.price * UPGRADE_COST_PERCENT / 100
}

/// Toll multiplier for a level: 1x, 2x, 3x, 4x
pub fn toll_multiplier(level: u8) -> Money {
    Money::from(level) + 1
}

/// Toll owed by a visitor at the cell's current level
pub fn toll_owed(cell: &Cell) -> Money {
    cell.toll * toll_multiplier(cell.level)
}

/// What the bank pays for a cell: 70% of its price plus all upgrade spend
pub fn liquidation_value(cell: &Cell) -> Money {
    let sunk = cell.price + Money::from(cell.level) * upgrade_cost(cell);
    sunk * LIQUIDATION_PERCENT / 100
}

/// Whether the cell can still be improved
pub fn can_upgrade(cell: &Cell) -> bool {
    cell.kind.is_ownable() && cell.level < MAX_LEVEL
}

/// Result of moving a token around the loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Movement {
    pub from: usize,
    pub to: usize,
    /// Whether the move passed (or landed on) the start cell
    pub passed_start: bool,
}

/// Advance `from` by `steps` on a loop of `board_len` cells.
///
/// A move wraps at most once for salary purposes, however large `steps` is.
pub fn advance(from: usize, steps: u32, board_len: usize) -> Movement {
    let travelled = from + steps as usize;
    Movement {
        from,
        to: travelled % board_len,
        passed_start: travelled >= board_len,
    }
}

/// Cash plus the sale value of every cell the party owns
pub fn net_worth(board: &Board, party: PartyId, cash: Money) -> Money {
    cash + board
        .owned_by(party)
        .map(liquidation_value)
        .sum::<Money>()
}
