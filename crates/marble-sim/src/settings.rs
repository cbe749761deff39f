//! Simulator settings read from the environment.

use marble_core::{BoardConfig, ConfigError};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("{name} must be a non-negative integer, got {value:?}")]
    InvalidNumber { name: &'static str, value: String },

    #[error("{name} must be a boolean, got {value:?}")]
    InvalidFlag { name: &'static str, value: String },

    #[error("Could not read board file {path}: {source}")]
    BoardFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid board: {0}")]
    Board(#[from] ConfigError),
}

/// How many matches to play and on which board
#[derive(Debug, Clone)]
pub struct SimSettings {
    pub board: BoardConfig,
    /// Seed of the first match; match `i` uses `seed + i`
    pub seed: u64,
    pub games: u32,
    /// Turn cap per match
    pub max_turns: u32,
    /// Write a JSON line for every finished turn, not just match summaries
    pub snapshots: bool,
}

impl Default for SimSettings {
    fn default() -> Self {
        Self {
            board: BoardConfig::classic(),
            seed: 1,
            games: 10,
            max_turns: 1_000,
            snapshots: true,
        }
    }
}

impl SimSettings {
    /// Read `MARBLE_BOARD`, `MARBLE_SEED`, `MARBLE_GAMES`, `MARBLE_MAX_TURNS`
    /// and `MARBLE_SNAPSHOTS`
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let board = match lookup("MARBLE_BOARD") {
            Some(path) => {
                let path = PathBuf::from(path);
                let json = std::fs::read_to_string(&path)
                    .map_err(|source| SettingsError::BoardFile { path, source })?;
                BoardConfig::from_json(&json)?
            }
            None => defaults.board,
        };

        Ok(Self {
            board,
            seed: number(&lookup, "MARBLE_SEED")?.unwrap_or(defaults.seed),
            games: number(&lookup, "MARBLE_GAMES")?.unwrap_or(defaults.games),
            max_turns: number(&lookup, "MARBLE_MAX_TURNS")?.unwrap_or(defaults.max_turns),
            snapshots: flag(&lookup, "MARBLE_SNAPSHOTS")?.unwrap_or(defaults.snapshots),
        })
    }
}

fn number<F, T>(lookup: &F, name: &'static str) -> Result<Option<T>, SettingsError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| SettingsError::InvalidNumber { name, value }),
    }
}

fn flag<F>(lookup: &F, name: &'static str) -> Result<Option<bool>, SettingsError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(None),
        Some(value) => match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(Some(true)),
            "0" | "false" | "no" | "off" => Ok(Some(false)),
            _ => Err(SettingsError::InvalidFlag { name, value }),
        },
    }
}
