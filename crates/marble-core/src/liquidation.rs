//! Forced sale of owned cells when a party cannot pay.
//!
//! Two variants share the same sale primitive:
//! - interactive: the deciding party picks a subset of its cells
//!   ([`sell_selection`]); the engine re-checks affordability afterwards
//! - automatic: lowest-level cells go first, in acquisition order on ties,
//!   until the obligation is covered ([`auto_liquidate`])
//!
//! A sale clears owner and level and credits the seller in one step.

use crate::actions::{GameEvent, LiquidationCandidate, LiquidationRequest};
use crate::board::CellId;
use crate::economy;
use crate::game::{GameError, MatchState};
use std::collections::HashSet;
use tracing::debug;

/// Cells the debtor may sell toward the request, in acquisition order
pub fn candidates(
    state: &MatchState,
    request: &LiquidationRequest,
) -> Result<Vec<LiquidationCandidate>, GameError> {
    let debtor = state.party(request.debtor)?;
    let protected = request.obligation.protected_cell();

    debtor
        .owned
        .iter()
        .filter(|&&cell| Some(cell) != protected)
        .map(|&id| {
            let cell = state.board.cell(id)?;
            Ok(LiquidationCandidate {
                cell: id,
                level: cell.level,
                value: economy::liquidation_value(cell),
            })
        })
        .collect()
}

/// Reject a selection containing anything that was not offered
fn validate_selection(
    offered: &[LiquidationCandidate],
    selection: &[CellId],
) -> Result<(), GameError> {
    let mut seen = HashSet::new();
    for &cell in selection {
        if !offered.iter().any(|c| c.cell == cell) {
            return Err(GameError::IllegalChoice(format!(
                "cell {} is not available for sale",
                cell
            )));
        }
        if !seen.insert(cell) {
            return Err(GameError::IllegalChoice(format!(
                "cell {} selected twice",
                cell
            )));
        }
    }
    Ok(())
}

/// Sell every cell in `selection` for the debtor.
///
/// The whole selection is validated first; an illegal selection sells
/// nothing.
pub fn sell_selection(
    state: &mut MatchState,
    request: &LiquidationRequest,
    selection: &[CellId],
    events: &mut Vec<GameEvent>,
) -> Result<(), GameError> {
    let offered = candidates(state, request)?;
    validate_selection(&offered, selection)?;

    for &cell in selection {
        let value = state.sell(request.debtor, cell)?;
        events.push(GameEvent::PropertySold {
            party: request.debtor,
            cell,
            value,
        });
    }
    Ok(())
}

/// Order in which the automatic policy sells: ascending level, acquisition
/// order on ties
pub fn greedy_order(
    state: &MatchState,
    request: &LiquidationRequest,
) -> Result<Vec<CellId>, GameError> {
    let mut offered = candidates(state, request)?;
    // Stable sort keeps acquisition order among equal levels
    offered.sort_by_key(|c| c.level);
    Ok(offered.into_iter().map(|c| c.cell).collect())
}

/// Sell cells one at a time until the debtor can pay `request.amount` or has
/// nothing left to sell. Returns whether the obligation is now covered.
pub fn auto_liquidate(
    state: &mut MatchState,
    request: &LiquidationRequest,
    events: &mut Vec<GameEvent>,
) -> Result<bool, GameError> {
    for cell in greedy_order(state, request)? {
        if state.party(request.debtor)?.can_afford(request.amount) {
            break;
        }
        let value = state.sell(request.debtor, cell)?;
        debug!(party = request.debtor, cell, value, "automatic sale");
        events.push(GameEvent::PropertySold {
            party: request.debtor,
            cell,
            value,
        });
    }

    Ok(state.party(request.debtor)?.can_afford(request.amount))
}
