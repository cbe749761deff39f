//! Integration tests for the Marble game engine.
//!
//! These tests verify complete match flows from the first roll through to
//! bankruptcy, plus the scripted scenarios the rules are defined by.

use marble_core::*;
use pretty_assertions::assert_eq;
use std::cell::RefCell;
use std::rc::Rc;

/// Cash entering or leaving the pair of parties for one event. Tolls move
/// money between parties and do not count.
fn external_flow(event: &GameEvent) -> Money {
    match event {
        GameEvent::SalaryPaid { amount, .. } => *amount,
        GameEvent::ChanceDrawn { delta, .. } => *delta,
        GameEvent::TaxPaid { amount, .. } => -amount,
        GameEvent::PropertyPurchased { price, .. } => -price,
        GameEvent::PropertyUpgraded { cost, .. } => -cost,
        GameEvent::PropertySold { value, .. } => *value,
        _ => 0,
    }
}

fn scripted_match(controllers: [Controller; 2], rng: ScriptedRandom) -> Game<ScriptedRandom> {
    Game::with_random(
        BoardConfig::classic(),
        [
            ("A".to_string(), controllers[0]),
            ("B".to_string(), controllers[1]),
        ],
        rng,
    )
    .unwrap()
}

/// Play a bot-vs-bot match, checking invariants after every turn
fn play_checked(seed: u64, max_turns: u32) -> (Game, Vec<GameEvent>) {
    let mut game = Game::bot_vs_bot(BoardConfig::classic(), seed).unwrap();
    let mut all_events = Vec::new();
    let mut expected_total = game.state().total_cash();

    for _ in 0..max_turns {
        if game.is_finished() {
            break;
        }
        let events = game.play_automated_turn().unwrap();
        expected_total += events.iter().map(external_flow).sum::<Money>();

        let state = game.state();
        assert_eq!(state.total_cash(), expected_total, "money leaked (seed {})", seed);
        assert!(state.ownership_consistent(), "ownership diverged (seed {})", seed);
        for cell in state.board.cells() {
            assert!(cell.level <= economy::MAX_LEVEL);
            if cell.owner.is_none() {
                assert_eq!(cell.level, 0);
            }
        }
        for party in &state.parties {
            assert!(party.position < state.board.len());
            if !game.is_finished() {
                assert!(party.cash >= 0, "negative cash without bankruptcy");
            }
        }

        all_events.extend(events);
    }

    (game, all_events)
}

#[test]
fn test_bot_matches_keep_invariants() {
    for seed in 0..20 {
        play_checked(seed, 500);
    }
}

#[test]
fn test_bot_match_eventually_ends() {
    let finished = (0..20)
        .map(|seed| play_checked(seed, 2_000).0)
        .filter(|game| game.is_finished())
        .count();
    assert!(finished > 0, "no match ended in 2,000 turns");
}

#[test]
fn test_finished_match_has_single_winner() {
    for seed in 0..20 {
        let (game, events) = play_checked(seed, 2_000);
        let Some(winner) = game.winner() else {
            continue;
        };
        let loser = 1 - winner;

        assert!(game.state().parties[usize::from(loser)].cash < 0);
        let champion = &game.state().parties[usize::from(winner)];
        assert_eq!(
            events.last(),
            Some(&GameEvent::GameWon {
                party: winner,
                cash: champion.cash,
                properties: champion.owned.len(),
            })
        );
        assert!(events.contains(&GameEvent::Bankrupt {
            party: loser,
            cash: game.state().parties[usize::from(loser)].cash,
        }));
        assert_eq!(game.valid_actions(0), vec![]);
        assert_eq!(game.valid_actions(1), vec![]);

        let mut game = game;
        assert_eq!(game.roll(), Err(GameError::GameOver));
    }
}

#[test]
fn test_same_seed_replays_identically() {
    let (a, events_a) = play_checked(77, 300);
    let (b, events_b) = play_checked(77, 300);
    assert_eq!(events_a, events_b);
    assert_eq!(a.state(), b.state());
    assert_eq!(a.history(), b.history());
}

#[test]
fn test_history_has_one_snapshot_per_turn() {
    let (game, events) = play_checked(5, 200);
    let turns_ended = events
        .iter()
        .filter(|e| matches!(e, GameEvent::TurnEnded { .. }))
        .count();
    let extra = usize::from(game.is_finished());
    assert_eq!(game.history().len(), turns_ended + extra);

    for (i, snapshot) in game.history().iter().enumerate() {
        assert_eq!(snapshot.turn as usize, i + 1);
        assert_eq!(snapshot.acting_party as usize, i % 2);
        assert!((1..=6).contains(&snapshot.roll));
    }
}

#[test]
fn test_snapshot_json_is_stable() {
    let (game, _) = play_checked(9, 30);
    let json = serde_json::to_string(game.history()).unwrap();
    let parsed: Vec<TurnSnapshot> = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, game.history());
}

#[test]
fn test_toll_covered_by_automatic_liquidation() {
    let mut game = scripted_match(
        [Controller::Automated, Controller::Automated],
        ScriptedRandom::new().with_dice([2]),
    );
    {
        let state = game.state_mut().unwrap();
        state.parties[0].cash = 40_000;
        state.assign(0, 1, 0).unwrap(); // Seoul, sells for 35,000
        state.assign(0, 4, 0).unwrap(); // Daegu, sells for 49,000
        state.assign(1, 2, 1).unwrap(); // Busan: toll 30,000 x 2
    }
    let owner_before = game.state().parties[1].cash;

    let events = game.play_automated_turn().unwrap();

    let proceeds: Money = events
        .iter()
        .filter_map(|e| match e {
            GameEvent::PropertySold { value, .. } => Some(*value),
            _ => None,
        })
        .sum();
    assert_eq!(proceeds, 35_000);
    assert_eq!(game.state().parties[0].cash, 40_000 + proceeds - 60_000);
    assert_eq!(game.state().parties[1].cash, owner_before + 60_000);
    assert_eq!(game.state().parties[0].owned, vec![4]);
    assert_eq!(game.current_party(), 1);
    assert!(!game.is_finished());
}

#[test]
fn test_salary_once_when_wrapping() {
    let mut game = scripted_match(
        [Controller::Deferred, Controller::Automated],
        ScriptedRandom::new().with_picks([0]),
    );
    game.state_mut().unwrap().parties[0].position = 18;

    let events = game.apply_roll(5).unwrap();

    assert_eq!(game.state().parties[0].position, 3);
    let salary: Vec<_> = events
        .iter()
        .filter(|e| matches!(e, GameEvent::SalaryPaid { .. }))
        .collect();
    assert_eq!(
        salary,
        vec![&GameEvent::SalaryPaid {
            party: 0,
            amount: 100_000
        }]
    );
    // Salary plus the first card (+50,000)
    assert_eq!(game.state().parties[0].cash, 1_150_000);
}

#[test]
fn test_landing_on_start_pays_salary() {
    let mut game = scripted_match(
        [Controller::Deferred, Controller::Automated],
        ScriptedRandom::new(),
    );
    game.state_mut().unwrap().parties[0].position = 17;
    game.apply_roll(3).unwrap();
    assert_eq!(game.state().parties[0].position, 0);
    assert_eq!(game.state().parties[0].cash, 1_100_000);
}

#[test]
fn test_chance_penalty_bankrupts_immediately() {
    let mut game = scripted_match(
        [Controller::Automated, Controller::Automated],
        ScriptedRandom::new().with_dice([3]).with_picks([3]),
    );
    game.state_mut().unwrap().parties[0].cash = 30_000;
    // Holdings are not sold for a chance penalty
    game.state_mut().unwrap().assign(0, 1, 2).unwrap();

    let events = game.play_automated_turn().unwrap();

    assert_eq!(game.state().parties[0].cash, -10_000);
    assert_eq!(game.winner(), Some(1));
    assert_eq!(game.phase(), &TurnPhase::GameOver { winner: 1 });
    assert!(!events
        .iter()
        .any(|e| matches!(e, GameEvent::PropertySold { .. })));
    assert_eq!(
        game.history().last().map(|s| &s.effect),
        Some(&Effect::Bankrupt { winner: 1 })
    );
}

#[test]
fn test_bot_toll_bankruptcy_pays_everything() {
    let mut game = scripted_match(
        [Controller::Automated, Controller::Automated],
        ScriptedRandom::new().with_dice([6]),
    );
    {
        let state = game.state_mut().unwrap();
        state.parties[0].cash = 0;
        state.parties[0].position = 13;
        state.assign(0, 1, 0).unwrap();
        state.assign(1, 19, 3).unwrap(); // Cheongju: 600,000 toll
    }
    let owner_before = game.state().parties[1].cash;

    game.play_automated_turn().unwrap();

    // Seoul sold for 35,000, then the full toll is charged
    assert_eq!(game.state().parties[0].cash, 35_000 - 600_000);
    assert_eq!(game.state().parties[1].cash, owner_before + 600_000);
    assert!(game.state().parties[0].owned.is_empty());
    assert_eq!(game.winner(), Some(1));
    assert!(game.state().ownership_consistent());
}

#[test]
fn test_human_full_turn_cycle() {
    let log = Rc::new(RefCell::new(EventLog::default()));
    let mut game = scripted_match(
        [Controller::Deferred, Controller::Automated],
        ScriptedRandom::new().with_dice([1, 1, 1]),
    );
    game.add_observer(Box::new(Rc::clone(&log)));

    // Human lands on Seoul and buys it
    game.roll().unwrap();
    assert_eq!(
        game.valid_actions(0),
        vec![
            GameAction::Answer(Answer::YesNo(true)),
            GameAction::Answer(Answer::YesNo(false)),
        ]
    );
    game.resume(Answer::YesNo(true)).unwrap();

    // Bot lands on Seoul and pays the toll
    let events = game.run_to_completion(10).unwrap();
    assert!(events.contains(&GameEvent::TollPaid {
        payer: 1,
        owner: 0,
        cell: 1,
        amount: 25_000
    }));
    assert_eq!(game.current_party(), 0);

    // Human moves to Busan and is offered it
    game.roll().unwrap();
    assert_eq!(
        game.pending_decision(),
        Some(PendingDecision::YesNo(Choice::Purchase {
            cell: 2,
            price: 60_000
        }))
    );
    game.resume(Answer::YesNo(false)).unwrap();

    assert_eq!(game.state().parties[0].cash, 1_000_000 - 50_000 + 25_000);
    assert_eq!(game.state().parties[1].cash, 1_000_000 - 25_000);
    assert_eq!(game.history().len(), 3);

    let messages = log.borrow().messages();
    assert_eq!(messages.len(), 10);
    assert_eq!(messages[0], "It is B's turn.");
    assert_eq!(messages[1], "A passed on buying Busan.");
}

#[test]
fn test_human_sells_to_cover_upgrade() {
    let mut game = scripted_match(
        [Controller::Deferred, Controller::Automated],
        ScriptedRandom::new(),
    );
    {
        let state = game.state_mut().unwrap();
        state.parties[0].cash = 20_000;
        state.assign(0, 2, 0).unwrap();
        state.assign(0, 1, 0).unwrap();
    }

    game.apply_roll(2).unwrap();
    match game.pending_decision() {
        Some(PendingDecision::Liquidation {
            request,
            candidates,
            deficit,
        }) => {
            assert_eq!(request.obligation, Obligation::Upgrade { cell: 2 });
            assert_eq!(deficit, 10_000);
            assert_eq!(candidates.len(), 1);
            assert_eq!(candidates[0].cell, 1);
        }
        other => panic!("expected liquidation, got {:?}", other),
    }

    let events = game.resume(Answer::Liquidate(vec![1])).unwrap();
    assert!(events.contains(&GameEvent::PropertyUpgraded {
        party: 0,
        cell: 2,
        level: 1,
        cost: 30_000
    }));
    assert_eq!(game.state().parties[0].cash, 20_000 + 35_000 - 30_000);
    assert_eq!(game.state().parties[0].owned, vec![2]);
}

#[test]
fn test_illegal_answers_leave_state_unchanged() {
    let mut game = scripted_match(
        [Controller::Deferred, Controller::Automated],
        ScriptedRandom::new(),
    );
    {
        let state = game.state_mut().unwrap();
        state.parties[0].cash = 10_000;
        state.assign(0, 1, 0).unwrap();
        state.assign(1, 4, 0).unwrap();
        state.assign(1, 2, 0).unwrap();
    }
    game.apply_roll(2).unwrap();
    let before = game.state().clone();

    for answer in [
        Answer::Liquidate(vec![4]),
        Answer::Liquidate(vec![1, 1]),
        Answer::Liquidate(vec![99]),
        Answer::YesNo(true),
    ] {
        let result = game.resume(answer);
        assert!(matches!(result, Err(GameError::IllegalChoice(_))));
        assert_eq!(game.state(), &before);
    }
    assert_eq!(
        game.apply_action(1, GameAction::Answer(Answer::Liquidate(vec![]))),
        Err(GameError::NotYourTurn)
    );
    assert_eq!(game.apply_roll(3), Err(GameError::InvalidPhase));
    assert_eq!(game.state(), &before);
}

#[test]
fn test_custom_board_from_json() {
    let json = r#"{
        "cells": [
            { "label": "Go", "kind": "start" },
            { "label": "Park", "kind": "ownable", "price": 10000, "toll": 5000 },
            { "label": "Jail", "kind": "rest" },
            { "label": "Levy", "kind": "tax" }
        ],
        "chance_cards": [],
        "rules": { "starting_cash": 20000, "tax": 25000 }
    }"#;
    let config = BoardConfig::from_json(json).unwrap();
    let mut game = Game::with_random(
        config,
        [
            ("A".to_string(), Controller::Deferred),
            ("B".to_string(), Controller::Deferred),
        ],
        ScriptedRandom::new(),
    )
    .unwrap();

    assert_eq!(game.state().parties[1].cash, 20_000);
    game.apply_roll(3).unwrap();
    assert_eq!(game.winner(), Some(1));
    assert_eq!(game.state().parties[0].cash, -5_000);
}

#[test]
fn test_invalid_config_rejected() {
    let mut config = BoardConfig::classic();
    config.rules.starting_cash = 0;
    let result = Game::bot_vs_bot(config, 1);
    assert!(matches!(result, Err(ConfigError::InvalidStartingCash)));
}
