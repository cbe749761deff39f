//! Core turn engine.
//!
//! This module contains the `MatchState` aggregate (board + both parties) and
//! the `Game` state machine that resolves turns against it.
//!
//! A turn runs roll → move → land → resolve → settle → advance inside a
//! single call. It only stops early at a choice point owned by a deferred
//! (human) party: the phase becomes `AwaitingChoice` or
//! `AwaitingLiquidation`, and the turn continues from exactly that point when
//! [`Game::resume`] supplies an answer.

use crate::actions::{
    Answer, Choice, Effect, GameAction, GameEvent, LiquidationRequest, Obligation,
    PendingDecision, TurnSnapshot,
};
use crate::bankruptcy::{self, Verdict};
use crate::board::{Board, CellId, CellKind, Money, PartyId};
use crate::bot::Bot;
use crate::config::{BoardConfig, ChanceCard, ConfigError, Rules};
use crate::dice::{RandomSource, SeededRandom};
use crate::economy::{self, MAX_LEVEL};
use crate::liquidation;
use crate::observer::{self, TurnObserver};
use crate::player::{opponent, Controller, Party};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

/// Where the engine is within the current turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnPhase {
    /// Waiting for the acting party to roll
    AwaitingRoll,
    /// Suspended on a yes/no offer to a deferred party
    AwaitingChoice(Choice),
    /// Suspended until a deferred party picks cells to sell
    AwaitingLiquidation(LiquidationRequest),
    /// Terminal
    GameOver { winner: PartyId },
}

/// Errors that can occur when applying actions
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum GameError {
    #[error("Index {0} out of range")]
    OutOfRange(usize),

    #[error("Illegal choice: {0}")]
    IllegalChoice(String),

    #[error("Not your turn")]
    NotYourTurn,

    #[error("Invalid action for current phase")]
    InvalidPhase,

    #[error("A roll must move at least one cell")]
    InvalidRoll,

    #[error("Game is over")]
    GameOver,
}

/// Board and parties, the only mutable state of a match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchState {
    pub board: Board,
    pub parties: [Party; 2],
    /// Party whose turn it is
    pub current: PartyId,
    pub phase: TurnPhase,
    /// Turn number (starts at 1)
    pub turn_number: u32,
    /// Most recent roll
    pub last_roll: Option<u32>,
}

impl MatchState {
    pub fn new(board: Board, parties: [Party; 2]) -> Self {
        Self {
            board,
            parties,
            current: 0,
            phase: TurnPhase::AwaitingRoll,
            turn_number: 1,
            last_roll: None,
        }
    }

    /// Get a party by ID
    pub fn party(&self, id: PartyId) -> Result<&Party, GameError> {
        self.parties
            .get(usize::from(id))
            .ok_or(GameError::OutOfRange(usize::from(id)))
    }

    fn party_mut(&mut self, id: PartyId) -> Result<&mut Party, GameError> {
        self.parties
            .get_mut(usize::from(id))
            .ok_or(GameError::OutOfRange(usize::from(id)))
    }

    /// The party whose turn it is
    pub fn acting(&self) -> Result<&Party, GameError> {
        self.party(self.current)
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.phase, TurnPhase::GameOver { .. })
    }

    pub fn winner(&self) -> Option<PartyId> {
        match self.phase {
            TurnPhase::GameOver { winner } => Some(winner),
            _ => None,
        }
    }

    /// Total cash held by both parties
    pub fn total_cash(&self) -> Money {
        self.parties.iter().map(|p| p.cash).sum()
    }

    /// Cash plus the sale value of every owned cell
    pub fn net_worth(&self, party: PartyId) -> Result<Money, GameError> {
        let cash = self.party(party)?.cash;
        Ok(economy::net_worth(&self.board, party, cash))
    }

    /// Check that board owners and party holdings agree, and that unowned
    /// cells sit at level 0
    pub fn ownership_consistent(&self) -> bool {
        let board_side = self.board.cells().iter().all(|cell| match cell.owner {
            Some(owner) => self
                .party(owner)
                .map(|p| p.owns(cell.id))
                .unwrap_or(false),
            None => cell.level == 0 && self.parties.iter().all(|p| !p.owns(cell.id)),
        });
        let party_side = self.parties.iter().all(|party| {
            party
                .owned
                .iter()
                .all(|&id| matches!(self.board.owner_of(id), Ok(Some(o)) if o == party.id))
        });
        board_side && party_side
    }

    /// Put a cell into a party's holdings at `level` without payment.
    ///
    /// Used to set up scenarios and handicap starts. Any previous owner loses
    /// the cell.
    pub fn assign(&mut self, party: PartyId, cell: CellId, level: u8) -> Result<(), GameError> {
        if !self.board.cell(cell)?.kind.is_ownable() {
            return Err(GameError::IllegalChoice(format!("cell {} is not ownable", cell)));
        }
        if level > MAX_LEVEL {
            return Err(GameError::IllegalChoice(format!("level {} is above maximum", level)));
        }
        self.party(party)?;

        if let Some(previous) = self.board.owner_of(cell)? {
            self.party_mut(previous)?.release(cell);
        }
        self.board.set_owner(cell, party)?;
        self.board.set_level(cell, level)?;
        self.party_mut(party)?.acquire(cell);
        Ok(())
    }

    fn buy(&mut self, party: PartyId, cell: CellId, price: Money) -> Result<(), GameError> {
        if self.board.cell(cell)?.is_owned() {
            return Err(GameError::IllegalChoice(format!("cell {} is already owned", cell)));
        }
        self.board.set_owner(cell, party)?;
        let buyer = self.party_mut(party)?;
        buyer.cash -= price;
        buyer.acquire(cell);
        Ok(())
    }

    /// Raise a cell one level, returning the new level
    fn improve(&mut self, party: PartyId, cell: CellId, cost: Money) -> Result<u8, GameError> {
        let target = self.board.cell(cell)?;
        if target.owner != Some(party) {
            return Err(GameError::IllegalChoice(format!("cell {} is not yours", cell)));
        }
        if !economy::can_upgrade(target) {
            return Err(GameError::IllegalChoice(format!("cell {} is at maximum level", cell)));
        }
        let level = target.level + 1;
        self.board.set_level(cell, level)?;
        self.party_mut(party)?.cash -= cost;
        Ok(level)
    }

    /// Sell a cell back to the bank, returning the amount credited
    pub(crate) fn sell(&mut self, party: PartyId, cell: CellId) -> Result<Money, GameError> {
        let target = self.board.cell(cell)?;
        if target.owner != Some(party) || !self.party(party)?.owns(cell) {
            return Err(GameError::IllegalChoice(format!("cell {} is not yours to sell", cell)));
        }
        let value = economy::liquidation_value(target);

        self.board.clear_ownership(cell)?;
        let seller = self.party_mut(party)?;
        seller.release(cell);
        seller.cash += value;
        Ok(value)
    }

    /// Check that a pending obligation can still be carried out once funded
    fn check_obligation(&self, request: &LiquidationRequest) -> Result<(), GameError> {
        match request.obligation {
            Obligation::Upgrade { cell } => {
                let target = self.board.cell(cell)?;
                if target.owner != Some(request.debtor) || !economy::can_upgrade(target) {
                    return Err(GameError::IllegalChoice(format!(
                        "cell {} can no longer be upgraded",
                        cell
                    )));
                }
            }
            Obligation::Toll { cell, owner } => {
                if self.board.owner_of(cell)? != Some(owner) {
                    return Err(GameError::IllegalChoice(format!(
                        "no toll is owed on cell {}",
                        cell
                    )));
                }
            }
        }
        Ok(())
    }

    fn transfer(&mut self, from: PartyId, to: PartyId, amount: Money) -> Result<(), GameError> {
        self.party(to)?;
        self.party_mut(from)?.cash -= amount;
        self.party_mut(to)?.cash += amount;
        Ok(())
    }
}

/// Roll and landing of the turn in progress, kept for its snapshot
#[derive(Debug, Clone, Copy, Default)]
struct TurnRecord {
    roll: u32,
    landed: CellId,
}

/// The turn engine. Owns the match state and is its only writer.
pub struct Game<R: RandomSource = SeededRandom> {
    state: MatchState,
    rules: Rules,
    chance_cards: Vec<ChanceCard>,
    bot: Bot,
    rng: R,
    observers: Vec<Box<dyn TurnObserver>>,
    history: Vec<TurnSnapshot>,
    published: usize,
    turn: TurnRecord,
}

impl Game<SeededRandom> {
    /// Create a match from configuration with a seeded random source
    pub fn new(
        config: BoardConfig,
        players: [(String, Controller); 2],
        seed: u64,
    ) -> Result<Self, ConfigError> {
        Self::with_random(config, players, SeededRandom::new(seed))
    }

    /// Classic board, a human party 0 against an automated party 1
    pub fn human_vs_bot(seed: u64) -> Self {
        Self::build(
            BoardConfig::classic(),
            [
                ("Player".to_string(), Controller::Deferred),
                ("AI".to_string(), Controller::Automated),
            ],
            SeededRandom::new(seed),
        )
    }

    /// Two automated parties on the given board
    pub fn bot_vs_bot(config: BoardConfig, seed: u64) -> Result<Self, ConfigError> {
        Self::new(
            config,
            [
                ("AI 1".to_string(), Controller::Automated),
                ("AI 2".to_string(), Controller::Automated),
            ],
            seed,
        )
    }
}

impl<R: RandomSource> Game<R> {
    /// Create a match with an explicit random source
    pub fn with_random(
        config: BoardConfig,
        players: [(String, Controller); 2],
        rng: R,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config, players, rng))
    }

    fn build(config: BoardConfig, players: [(String, Controller); 2], rng: R) -> Self {
        let board = Board::from_config(&config);
        let cash = config.rules.starting_cash;
        let [(first, first_ctl), (second, second_ctl)] = players;
        let parties = [
            Party::new(0, first, cash, first_ctl),
            Party::new(1, second, cash, second_ctl),
        ];

        Self {
            state: MatchState::new(board, parties),
            bot: Bot::from_rules(&config.rules),
            rules: config.rules,
            chance_cards: config.chance_cards,
            rng,
            observers: Vec::new(),
            history: Vec::new(),
            published: 0,
            turn: TurnRecord::default(),
        }
    }

    pub fn state(&self) -> &MatchState {
        &self.state
    }

    /// Mutable access for setting up scenarios between turns. Refused while
    /// a turn is suspended or after the match has ended.
    pub fn state_mut(&mut self) -> Result<&mut MatchState, GameError> {
        match self.state.phase {
            TurnPhase::AwaitingRoll => Ok(&mut self.state),
            _ => Err(GameError::InvalidPhase),
        }
    }

    pub fn phase(&self) -> &TurnPhase {
        &self.state.phase
    }

    pub fn current_party(&self) -> PartyId {
        self.state.current
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_finished()
    }

    pub fn winner(&self) -> Option<PartyId> {
        self.state.winner()
    }

    /// Snapshots of every finished turn, oldest first
    pub fn history(&self) -> &[TurnSnapshot] {
        &self.history
    }

    pub fn add_observer(&mut self, observer: Box<dyn TurnObserver>) {
        self.observers.push(observer);
    }

    /// What the deferred decision source is being asked, if anything
    pub fn pending_decision(&self) -> Option<PendingDecision> {
        match &self.state.phase {
            TurnPhase::AwaitingChoice(choice) => Some(PendingDecision::YesNo(choice.clone())),
            TurnPhase::AwaitingLiquidation(request) => {
                let candidates = liquidation::candidates(&self.state, request).ok()?;
                let deficit = self.state.party(request.debtor).ok()?.deficit(request.amount);
                Some(PendingDecision::Liquidation {
                    request: request.clone(),
                    candidates,
                    deficit,
                })
            }
            _ => None,
        }
    }

    /// Get all currently valid actions for a party
    pub fn valid_actions(&self, party: PartyId) -> Vec<GameAction> {
        let mut actions = Vec::new();
        if party != self.state.current {
            return actions;
        }

        match &self.state.phase {
            TurnPhase::GameOver { .. } => {}
            TurnPhase::AwaitingRoll => actions.push(GameAction::RollDice),
            TurnPhase::AwaitingChoice(_) => {
                actions.push(GameAction::Answer(Answer::YesNo(true)));
                actions.push(GameAction::Answer(Answer::YesNo(false)));
            }
            TurnPhase::AwaitingLiquidation(request) => {
                actions.push(GameAction::Answer(Answer::Liquidate(Vec::new())));
                // Any subset of the candidates is valid; list the single sales
                if let Ok(candidates) = liquidation::candidates(&self.state, request) {
                    for candidate in candidates {
                        actions.push(GameAction::Answer(Answer::Liquidate(vec![candidate.cell])));
                    }
                }
            }
        }

        actions
    }

    /// Roll for the acting party
    pub fn roll(&mut self) -> Result<Vec<GameEvent>, GameError> {
        self.apply_action(self.state.current, GameAction::RollDice)
    }

    /// Answer the pending choice point for the acting party
    pub fn resume(&mut self, answer: Answer) -> Result<Vec<GameEvent>, GameError> {
        self.apply_action(self.state.current, GameAction::Answer(answer))
    }

    /// Play a turn with a known roll instead of drawing one
    pub fn apply_roll(&mut self, steps: u32) -> Result<Vec<GameEvent>, GameError> {
        self.ensure_can_roll()?;
        if steps == 0 {
            return Err(GameError::InvalidRoll);
        }

        let mut events = Vec::new();
        self.play_roll(steps, &mut events)?;
        self.publish(&events);
        Ok(events)
    }

    /// Apply an action to the game state
    pub fn apply_action(
        &mut self,
        party: PartyId,
        action: GameAction,
    ) -> Result<Vec<GameEvent>, GameError> {
        if self.state.is_finished() {
            return Err(GameError::GameOver);
        }
        self.state.party(party)?;
        if party != self.state.current {
            return Err(GameError::NotYourTurn);
        }

        let mut events = Vec::new();

        match action {
            GameAction::RollDice => {
                self.ensure_can_roll()?;
                let roll = u32::from(self.rng.roll_die());
                self.play_roll(roll, &mut events)?;
            }
            GameAction::Answer(answer) => self.answer(answer, &mut events)?,
        }

        self.publish(&events);
        Ok(events)
    }

    /// Roll for an automated party
    pub fn play_automated_turn(&mut self) -> Result<Vec<GameEvent>, GameError> {
        if self.state.is_finished() {
            return Err(GameError::GameOver);
        }
        if !self.state.acting()?.is_automated() {
            return Err(GameError::NotYourTurn);
        }
        self.roll()
    }

    /// Play automated turns until the game ends, a deferred party has to
    /// act, or `max_turns` turns have been played
    pub fn run_to_completion(&mut self, max_turns: u32) -> Result<Vec<GameEvent>, GameError> {
        let mut events = Vec::new();
        let mut played = 0;

        while played < max_turns
            && self.state.phase == TurnPhase::AwaitingRoll
            && self.state.acting()?.is_automated()
        {
            events.extend(self.roll()?);
            played += 1;
        }

        Ok(events)
    }

    fn ensure_can_roll(&self) -> Result<(), GameError> {
        match self.state.phase {
            TurnPhase::AwaitingRoll => Ok(()),
            TurnPhase::GameOver { .. } => Err(GameError::GameOver),
            _ => Err(GameError::InvalidPhase),
        }
    }

    fn answer(&mut self, answer: Answer, events: &mut Vec<GameEvent>) -> Result<(), GameError> {
        match (self.state.phase.clone(), answer) {
            (TurnPhase::AwaitingChoice(choice), Answer::YesNo(yes)) => {
                self.resolve_choice(choice, yes, events)
            }
            (TurnPhase::AwaitingLiquidation(request), Answer::Liquidate(cells)) => {
                self.resolve_selection(request, cells, events)
            }
            (TurnPhase::AwaitingChoice(_), Answer::Liquidate(_))
            | (TurnPhase::AwaitingLiquidation(_), Answer::YesNo(_)) => Err(
                GameError::IllegalChoice("answer does not match the pending decision".to_string()),
            ),
            _ => Err(GameError::InvalidPhase),
        }
    }

    // ==================== Turn resolution ====================

    fn play_roll(&mut self, roll: u32, events: &mut Vec<GameEvent>) -> Result<(), GameError> {
        let party = self.state.current;
        self.state.last_roll = Some(roll);
        events.push(GameEvent::DiceRolled { party, roll });

        let from = self.state.party(party)?.position;
        let movement = economy::advance(from, roll, self.state.board.len());
        let salary = self.rules.salary;

        let mover = self.state.party_mut(party)?;
        mover.position = movement.to;
        events.push(GameEvent::Moved {
            party,
            from: movement.from,
            to: movement.to,
        });
        if movement.passed_start {
            mover.cash += salary;
            events.push(GameEvent::SalaryPaid {
                party,
                amount: salary,
            });
        }

        debug!(party, roll, from, to = movement.to, "moved");
        self.turn = TurnRecord {
            roll,
            landed: movement.to,
        };
        self.resolve_landing(party, movement.to, events)
    }

    fn resolve_landing(
        &mut self,
        party: PartyId,
        cell_id: CellId,
        events: &mut Vec<GameEvent>,
    ) -> Result<(), GameError> {
        let cell = self.state.board.cell(cell_id)?.clone();
        events.push(GameEvent::Landed {
            party,
            cell: cell_id,
        });

        match cell.kind {
            CellKind::Ownable => self.resolve_ownable(party, cell_id, events),
            CellKind::Chance => {
                let index = self.rng.pick(self.chance_cards.len());
                let card = self
                    .chance_cards
                    .get(index)
                    .cloned()
                    .ok_or(GameError::OutOfRange(index))?;

                self.state.party_mut(party)?.cash += card.delta;
                events.push(GameEvent::ChanceDrawn {
                    party,
                    label: card.label,
                    delta: card.delta,
                });
                self.settle_mandatory(party, Effect::Chance { delta: card.delta }, events)
            }
            CellKind::Tax => {
                let amount = self.rules.tax;
                self.state.party_mut(party)?.cash -= amount;
                events.push(GameEvent::TaxPaid { party, amount });
                self.settle_mandatory(party, Effect::Tax { amount }, events)
            }
            CellKind::Rest => {
                events.push(GameEvent::Rested { party });
                self.end_turn(party, Effect::Rested, events)
            }
            CellKind::Start => self.end_turn(party, Effect::None, events),
        }
    }

    fn resolve_ownable(
        &mut self,
        party: PartyId,
        cell_id: CellId,
        events: &mut Vec<GameEvent>,
    ) -> Result<(), GameError> {
        let cell = self.state.board.cell(cell_id)?.clone();
        let cash = self.state.party(party)?.cash;

        match cell.owner {
            None => {
                let price = economy::purchase_price(&cell);
                if cash < price {
                    events.push(GameEvent::PurchaseUnaffordable {
                        party,
                        cell: cell_id,
                    });
                    return self.end_turn(party, Effect::None, events);
                }
                self.offer(
                    party,
                    Choice::Purchase {
                        cell: cell_id,
                        price,
                    },
                    events,
                )
            }

            Some(owner) if owner == party => {
                if !economy::can_upgrade(&cell) {
                    events.push(GameEvent::MaxLevelReached {
                        party,
                        cell: cell_id,
                    });
                    return self.end_turn(party, Effect::None, events);
                }

                let cost = economy::upgrade_cost(&cell);
                if cash >= cost {
                    self.offer(
                        party,
                        Choice::Upgrade {
                            cell: cell_id,
                            cost,
                            next_level: cell.level + 1,
                        },
                        events,
                    )
                } else {
                    self.begin_liquidation(
                        LiquidationRequest {
                            debtor: party,
                            amount: cost,
                            obligation: Obligation::Upgrade { cell: cell_id },
                        },
                        events,
                    )
                }
            }

            Some(owner) => {
                let toll = economy::toll_owed(&cell);
                if cash >= toll {
                    self.pay_toll(party, owner, cell_id, toll, events)?;
                    self.end_turn(
                        party,
                        Effect::TollPaid {
                            owner,
                            amount: toll,
                        },
                        events,
                    )
                } else {
                    self.begin_liquidation(
                        LiquidationRequest {
                            debtor: party,
                            amount: toll,
                            obligation: Obligation::Toll {
                                cell: cell_id,
                                owner,
                            },
                        },
                        events,
                    )
                }
            }
        }
    }

    /// Put a yes/no to the acting party's decision source
    fn offer(
        &mut self,
        party: PartyId,
        choice: Choice,
        events: &mut Vec<GameEvent>,
    ) -> Result<(), GameError> {
        if self.state.party(party)?.is_automated() {
            let yes = self.bot.decide(&choice, &mut self.rng);
            self.resolve_choice(choice, yes, events)
        } else {
            debug!(party, cell = choice.cell(), "awaiting decision");
            events.push(GameEvent::DecisionRequired { party });
            self.state.phase = TurnPhase::AwaitingChoice(choice);
            Ok(())
        }
    }

    fn resolve_choice(
        &mut self,
        choice: Choice,
        yes: bool,
        events: &mut Vec<GameEvent>,
    ) -> Result<(), GameError> {
        let party = self.state.current;

        if !yes {
            let event = match choice {
                Choice::Purchase { cell, .. } => GameEvent::PurchaseDeclined { party, cell },
                Choice::Upgrade { cell, .. } => GameEvent::UpgradeDeclined { party, cell },
            };
            events.push(event);
            return self.end_turn(party, Effect::Declined, events);
        }

        if !self.state.party(party)?.can_afford(choice.cost()) {
            return Err(GameError::IllegalChoice(
                "cannot afford the offered action".to_string(),
            ));
        }

        match choice {
            Choice::Purchase { cell, price } => {
                self.state.buy(party, cell, price)?;
                debug!(party, cell, price, "purchased");
                events.push(GameEvent::PropertyPurchased { party, cell, price });
                self.end_turn(party, Effect::Purchased { price }, events)
            }
            Choice::Upgrade { cell, cost, .. } => self.perform_upgrade(party, cell, cost, events),
        }
    }

    fn perform_upgrade(
        &mut self,
        party: PartyId,
        cell: CellId,
        cost: Money,
        events: &mut Vec<GameEvent>,
    ) -> Result<(), GameError> {
        let level = self.state.improve(party, cell, cost)?;
        debug!(party, cell, level, "upgraded");
        events.push(GameEvent::PropertyUpgraded {
            party,
            cell,
            level,
            cost,
        });
        self.end_turn(party, Effect::Upgraded { level, cost }, events)
    }

    fn pay_toll(
        &mut self,
        payer: PartyId,
        owner: PartyId,
        cell: CellId,
        amount: Money,
        events: &mut Vec<GameEvent>,
    ) -> Result<(), GameError> {
        self.state.transfer(payer, owner, amount)?;
        events.push(GameEvent::TollPaid {
            payer,
            owner,
            cell,
            amount,
        });
        Ok(())
    }

    // ==================== Liquidation ====================

    fn begin_liquidation(
        &mut self,
        request: LiquidationRequest,
        events: &mut Vec<GameEvent>,
    ) -> Result<(), GameError> {
        let debtor = self.state.party(request.debtor)?;
        let automated = debtor.is_automated();
        debug!(
            party = request.debtor,
            amount = request.amount,
            mandatory = request.obligation.is_mandatory(),
            "liquidation required"
        );
        events.push(GameEvent::LiquidationRequired {
            party: request.debtor,
            amount: request.amount,
            deficit: debtor.deficit(request.amount),
        });

        if automated {
            let covered = liquidation::auto_liquidate(&mut self.state, &request, events)?;
            return self.conclude_liquidation(request, covered, events);
        }

        if liquidation::candidates(&self.state, &request)?.is_empty() {
            return self.conclude_liquidation(request, false, events);
        }

        events.push(GameEvent::DecisionRequired {
            party: request.debtor,
        });
        self.state.phase = TurnPhase::AwaitingLiquidation(request);
        Ok(())
    }

    fn resolve_selection(
        &mut self,
        request: LiquidationRequest,
        cells: Vec<CellId>,
        events: &mut Vec<GameEvent>,
    ) -> Result<(), GameError> {
        self.state.check_obligation(&request)?;
        liquidation::sell_selection(&mut self.state, &request, &cells, events)?;

        let debtor = self.state.party(request.debtor)?;
        if debtor.can_afford(request.amount) {
            return self.conclude_liquidation(request, true, events);
        }

        let deficit = debtor.deficit(request.amount);
        if cells.is_empty() || liquidation::candidates(&self.state, &request)?.is_empty() {
            return self.conclude_liquidation(request, false, events);
        }

        // Still short with cells left to sell: ask again
        events.push(GameEvent::LiquidationRequired {
            party: request.debtor,
            amount: request.amount,
            deficit,
        });
        events.push(GameEvent::DecisionRequired {
            party: request.debtor,
        });
        self.state.phase = TurnPhase::AwaitingLiquidation(request);
        Ok(())
    }

    fn conclude_liquidation(
        &mut self,
        request: LiquidationRequest,
        covered: bool,
        events: &mut Vec<GameEvent>,
    ) -> Result<(), GameError> {
        let party = request.debtor;

        match request.obligation {
            Obligation::Upgrade { cell } => {
                if covered {
                    self.perform_upgrade(party, cell, request.amount, events)
                } else {
                    events.push(GameEvent::UpgradeAbandoned { party, cell });
                    self.end_turn(party, Effect::Declined, events)
                }
            }
            Obligation::Toll { cell, owner } => {
                // An uncovered toll is still charged in full; the debtor's
                // negative balance then ends the match.
                self.pay_toll(party, owner, cell, request.amount, events)?;
                self.settle_mandatory(
                    party,
                    Effect::TollPaid {
                        owner,
                        amount: request.amount,
                    },
                    events,
                )
            }
        }
    }

    // ==================== Settlement ====================

    /// After a mandatory charge: end the match on bankruptcy, otherwise
    /// end the turn
    fn settle_mandatory(
        &mut self,
        party: PartyId,
        effect: Effect,
        events: &mut Vec<GameEvent>,
    ) -> Result<(), GameError> {
        match bankruptcy::evaluate(&self.state, party)? {
            Verdict::Continue => self.end_turn(party, effect, events),
            Verdict::GameOver { winner } => {
                let cash = self.state.party(party)?.cash;
                info!(party, cash, winner, "bankrupt");
                events.push(GameEvent::Bankrupt { party, cash });
                let champion = self.state.party(winner)?;
                events.push(GameEvent::GameWon {
                    party: winner,
                    cash: champion.cash,
                    properties: champion.owned.len(),
                });
                self.state.phase = TurnPhase::GameOver { winner };
                self.record_snapshot(party, Effect::Bankrupt { winner })
            }
        }
    }

    fn end_turn(
        &mut self,
        party: PartyId,
        effect: Effect,
        events: &mut Vec<GameEvent>,
    ) -> Result<(), GameError> {
        self.record_snapshot(party, effect)?;

        let next_party = opponent(party);
        self.state.current = next_party;
        self.state.phase = TurnPhase::AwaitingRoll;
        self.state.turn_number += 1;
        events.push(GameEvent::TurnEnded { party, next_party });
        Ok(())
    }

    fn record_snapshot(&mut self, party: PartyId, effect: Effect) -> Result<(), GameError> {
        let snapshot = TurnSnapshot {
            turn: self.state.turn_number,
            acting_party: party,
            roll: self.turn.roll,
            landed_cell: self.turn.landed,
            effect,
            cash: [self.state.party(0)?.cash, self.state.party(1)?.cash],
        };
        self.history.push(snapshot);
        Ok(())
    }

    fn publish(&mut self, events: &[GameEvent]) {
        for event in events {
            let message = observer::narrate(event, &self.state);
            let category = event.category();
            for o in self.observers.iter_mut() {
                o.on_turn_event(&message, category);
            }
        }
        for snapshot in &self.history[self.published..] {
            for o in self.observers.iter_mut() {
                o.on_snapshot(snapshot);
            }
        }
        self.published = self.history.len();
    }
}
