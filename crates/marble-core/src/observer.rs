//! Outbound hooks: narration for the presentation layer and per-turn
//! snapshots for replication.
//!
//! Both are fire-and-forget. The engine never reads anything back from an
//! observer.

use crate::actions::{EventCategory, GameEvent, TurnSnapshot};
use crate::board::{CellId, Money, PartyId};
use crate::game::MatchState;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// Receives engine output
pub trait TurnObserver {
    /// A human-readable line describing something that just happened
    fn on_turn_event(&mut self, message: &str, category: EventCategory);

    /// Called once for every finished turn
    fn on_snapshot(&mut self, _snapshot: &TurnSnapshot) {}
}

impl<T: TurnObserver> TurnObserver for Rc<RefCell<T>> {
    fn on_turn_event(&mut self, message: &str, category: EventCategory) {
        self.borrow_mut().on_turn_event(message, category);
    }

    fn on_snapshot(&mut self, snapshot: &TurnSnapshot) {
        self.borrow_mut().on_snapshot(snapshot);
    }
}

/// Bounded log of recent narration, newest first
#[derive(Debug, Clone)]
pub struct EventLog {
    capacity: usize,
    entries: VecDeque<(String, EventCategory)>,
}

impl EventLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = &(String, EventCategory)> {
        self.entries.iter()
    }

    pub fn messages(&self) -> Vec<String> {
        self.entries.iter().map(|(m, _)| m.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new(10)
    }
}

impl TurnObserver for EventLog {
    fn on_turn_event(&mut self, message: &str, category: EventCategory) {
        self.entries.push_front((message.to_string(), category));
        self.entries.truncate(self.capacity);
    }
}

/// Format an amount with thousands separators, e.g. `-1,250,000`
pub fn format_money(amount: Money) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if amount < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn name(state: &MatchState, party: PartyId) -> &str {
    state.party(party).map(|p| p.name.as_str()).unwrap_or("?")
}

fn label(state: &MatchState, cell: CellId) -> &str {
    state.board.cell(cell).map(|c| c.label.as_str()).unwrap_or("?")
}

fn building(level: u8) -> &'static str {
    match level {
        1 => "house",
        2 => "building",
        _ => "hotel",
    }
}

/// Render an event as a narration line
pub fn narrate(event: &GameEvent, state: &MatchState) -> String {
    match event {
        GameEvent::DiceRolled { party, roll } => {
            format!("{} rolled a {}.", name(state, *party), roll)
        }
        GameEvent::Moved { party, from, to } => format!(
            "{} moved from {} to {}.",
            name(state, *party),
            label(state, *from),
            label(state, *to)
        ),
        GameEvent::SalaryPaid { party, amount } => format!(
            "{} passed Start and collected a salary of {}.",
            name(state, *party),
            format_money(*amount)
        ),
        GameEvent::Landed { party, cell } => {
            format!("{} arrived at {}.", name(state, *party), label(state, *cell))
        }
        GameEvent::DecisionRequired { party } => {
            format!("Waiting for {} to decide.", name(state, *party))
        }
        GameEvent::PropertyPurchased { party, cell, price } => format!(
            "{} bought {} for {}.",
            name(state, *party),
            label(state, *cell),
            format_money(*price)
        ),
        GameEvent::PurchaseDeclined { party, cell } => format!(
            "{} passed on buying {}.",
            name(state, *party),
            label(state, *cell)
        ),
        GameEvent::PurchaseUnaffordable { party, cell } => format!(
            "{} cannot afford {}.",
            name(state, *party),
            label(state, *cell)
        ),
        GameEvent::PropertyUpgraded {
            party,
            cell,
            level,
            cost,
        } => format!(
            "{} built a {} on {} for {} (Lv.{}).",
            name(state, *party),
            building(*level),
            label(state, *cell),
            format_money(*cost),
            level
        ),
        GameEvent::UpgradeDeclined { party, cell } => format!(
            "{} did not build on {}.",
            name(state, *party),
            label(state, *cell)
        ),
        GameEvent::UpgradeAbandoned { party, cell } => format!(
            "{} could not raise the funds to build on {}.",
            name(state, *party),
            label(state, *cell)
        ),
        GameEvent::MaxLevelReached { party, cell } => format!(
            "{} owns {} (maximum level).",
            name(state, *party),
            label(state, *cell)
        ),
        GameEvent::LiquidationRequired {
            party,
            amount,
            deficit,
        } => format!(
            "{} needs {} and is {} short; land must be sold.",
            name(state, *party),
            format_money(*amount),
            format_money(*deficit)
        ),
        GameEvent::PropertySold { party, cell, value } => format!(
            "{} sold {} for {}.",
            name(state, *party),
            label(state, *cell),
            format_money(*value)
        ),
        GameEvent::TollPaid {
            payer,
            owner,
            cell,
            amount,
        } => format!(
            "{} paid {} a toll of {} at {}.",
            name(state, *payer),
            name(state, *owner),
            format_money(*amount),
            label(state, *cell)
        ),
        GameEvent::ChanceDrawn { label, .. } => format!("Golden Key: {}", label),
        GameEvent::TaxPaid { party, amount } => format!(
            "{} paid {} in tax.",
            name(state, *party),
            format_money(*amount)
        ),
        GameEvent::Rested { party } => {
            format!("{} is stranded and rests this turn.", name(state, *party))
        }
        GameEvent::Bankrupt { party, cash } => format!(
            "{} is bankrupt with {}.",
            name(state, *party),
            format_money(*cash)
        ),
        GameEvent::TurnEnded { next_party, .. } => {
            format!("It is {}'s turn.", name(state, *next_party))
        }
        GameEvent::GameWon {
            party,
            cash,
            properties,
        } => format!(
            "Game over! {} wins with {} in cash and {} properties.",
            name(state, *party),
            format_money(*cash),
            properties
        ),
    }
}
