//! Marble - a two-player Blue Marble board game engine
//!
//! This crate provides the core game logic, including:
//! - A configurable loop of ownable and special cells
//! - The economy: purchases, upgrades, tolls, salary and forced sales
//! - A turn state machine that suspends at human choice points
//! - A stochastic automated opponent
//! - Bankruptcy detection and match termination
//!
//! # Architecture
//!
//! The engine is platform-agnostic and has no I/O of its own. Narration and
//! per-turn snapshots leave through [`observer::TurnObserver`]. It can be
//! compiled to:
//! - Native Rust for headless simulation
//! - WebAssembly for a browser front end (`wasm` feature)
//!
//! # Modules
//!
//! - [`board`]: Cells, ownership and the id/currency aliases
//! - [`config`]: Board layout, chance cards and rule constants
//! - [`economy`]: Pure pricing, toll and movement rules
//! - [`player`]: Party state and decision sources
//! - [`dice`]: The single random source
//! - [`actions`]: Actions, choice points, events and snapshots
//! - [`bot`]: The automated decision policy
//! - [`liquidation`]: Forced sales, interactive and greedy
//! - [`bankruptcy`]: End-of-match detection
//! - [`game`]: The turn engine
//! - [`observer`]: Narration log and snapshot hooks

pub mod actions;
pub mod bankruptcy;
pub mod board;
pub mod bot;
pub mod config;
pub mod dice;
pub mod economy;
pub mod game;
pub mod liquidation;
pub mod observer;
pub mod player;
#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used types
pub use actions::{
    Answer, Choice, Effect, EventCategory, GameAction, GameEvent, LiquidationCandidate,
    LiquidationRequest, Obligation, PendingDecision, TurnSnapshot,
};
pub use bankruptcy::Verdict;
pub use board::{Board, Cell, CellId, CellKind, Money, PartyId};
pub use bot::Bot;
pub use config::{BoardConfig, CellSpec, ChanceCard, ConfigError, Rules};
pub use dice::{RandomSource, ScriptedRandom, SeededRandom};
pub use game::{Game, GameError, MatchState, TurnPhase};
pub use observer::{EventLog, TurnObserver};
pub use player::{Controller, Party};
