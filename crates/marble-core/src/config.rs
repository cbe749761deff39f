//! Static match configuration: the cell list, chance cards and rule constants.
//!
//! Configuration is plain serde data so a board can be shipped as JSON.
//! [`BoardConfig::classic`] is the built-in 20-cell board.

use crate::board::{CellKind, Money};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest price, toll, card, salary, tax or starting balance a board may
/// configure. Keeps every derived amount well inside `Money`.
pub const MAX_AMOUNT: Money = 1_000_000_000_000;

/// Errors found while loading or validating a board configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid board JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Board needs at least 2 cells, got {0}")]
    TooFewCells(usize),

    #[error("Cell 0 must be the start cell")]
    MissingStart,

    #[error("Ownable cell {0} needs a positive price and toll")]
    InvalidOwnable(usize),

    #[error("Cell {0} is not ownable and must have zero price and toll")]
    PricedSpecialCell(usize),

    #[error("Board has chance cells but no chance cards")]
    NoChanceCards,

    #[error("Probability {0} is outside 0..=1")]
    InvalidProbability(f64),

    #[error("Starting cash must be positive")]
    InvalidStartingCash,

    #[error("Salary and tax must not be negative")]
    NegativeAmount,

    #[error("{what} of {amount} exceeds the limit of {}", MAX_AMOUNT)]
    AmountTooLarge { what: String, amount: Money },
}

fn check_amount(what: impl Fn() -> String, amount: Money) -> Result<(), ConfigError> {
    if amount.checked_abs().map_or(true, |a| a > MAX_AMOUNT) {
        return Err(ConfigError::AmountTooLarge {
            what: what(),
            amount,
        });
    }
    Ok(())
}

/// One cell of the configured board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellSpec {
    pub label: String,
    pub kind: CellKind,
    #[serde(default)]
    pub price: Money,
    #[serde(default)]
    pub toll: Money,
}

impl CellSpec {
    pub fn ownable(label: &str, price: Money, toll: Money) -> Self {
        Self {
            label: label.to_string(),
            kind: CellKind::Ownable,
            price,
            toll,
        }
    }

    pub fn special(label: &str, kind: CellKind) -> Self {
        Self {
            label: label.to_string(),
            kind,
            price: 0,
            toll: 0,
        }
    }
}

/// A random cash event drawn on a chance cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChanceCard {
    pub label: String,
    /// Signed change applied to the drawing party's cash
    pub delta: Money,
}

impl ChanceCard {
    pub fn new(label: &str, delta: Money) -> Self {
        Self {
            label: label.to_string(),
            delta,
        }
    }
}

/// Rule constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rules {
    /// Cash each party starts with
    pub starting_cash: Money,
    /// Paid once for every move that passes the start cell
    pub salary: Money,
    /// Charged on a tax cell
    pub tax: Money,
    /// Chance the automated party buys an affordable unowned cell
    pub buy_probability: f64,
    /// Chance the automated party upgrades an affordable owned cell
    pub upgrade_probability: f64,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            starting_cash: 1_000_000,
            salary: 100_000,
            tax: 50_000,
            buy_probability: 0.7,
            upgrade_probability: 0.5,
        }
    }
}

/// Everything needed to set up a match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardConfig {
    pub cells: Vec<CellSpec>,
    pub chance_cards: Vec<ChanceCard>,
    #[serde(default)]
    pub rules: Rules,
}

impl BoardConfig {
    /// The standard 20-cell board
    pub fn classic() -> Self {
        use CellKind::*;

        let cells = vec![
            CellSpec::special("Start", Start),
            CellSpec::ownable("Seoul", 50_000, 25_000),
            CellSpec::ownable("Busan", 60_000, 30_000),
            CellSpec::special("Golden Key", Chance),
            CellSpec::ownable("Daegu", 70_000, 35_000),
            CellSpec::ownable("Incheon", 80_000, 40_000),
            CellSpec::special("Desert Island", Rest),
            CellSpec::ownable("Gwangju", 90_000, 45_000),
            CellSpec::ownable("Daejeon", 100_000, 50_000),
            CellSpec::special("Golden Key", Chance),
            CellSpec::ownable("Ulsan", 110_000, 55_000),
            CellSpec::ownable("Suwon", 120_000, 60_000),
            CellSpec::special("Tax Office", Tax),
            CellSpec::ownable("Changwon", 130_000, 65_000),
            CellSpec::ownable("Jeju", 150_000, 75_000),
            CellSpec::special("Golden Key", Chance),
            CellSpec::ownable("Gangneung", 170_000, 85_000),
            CellSpec::ownable("Jeonju", 200_000, 100_000),
            CellSpec::ownable("Gyeongju", 250_000, 125_000),
            CellSpec::ownable("Cheongju", 300_000, 150_000),
        ];

        let chance_cards = vec![
            ChanceCard::new("Bank interest: collect 50,000", 50_000),
            ChanceCard::new("Speeding fine: pay 30,000", -30_000),
            ChanceCard::new("Lottery win: collect 100,000", 100_000),
            ChanceCard::new("Repair bill: pay 40,000", -40_000),
            ChanceCard::new("Bonus: collect 80,000", 80_000),
            ChanceCard::new("Tax bill: pay 50,000", -50_000),
        ];

        Self {
            cells,
            chance_cards,
            rules: Rules::default(),
        }
    }

    /// Parse and validate a board from JSON
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: BoardConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the configuration describes a playable board
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cells.len() < 2 {
            return Err(ConfigError::TooFewCells(self.cells.len()));
        }
        if self.cells[0].kind != CellKind::Start {
            return Err(ConfigError::MissingStart);
        }

        for (index, cell) in self.cells.iter().enumerate() {
            check_amount(|| format!("Price of cell {}", index), cell.price)?;
            check_amount(|| format!("Toll of cell {}", index), cell.toll)?;
            if cell.kind.is_ownable() {
                if cell.price <= 0 || cell.toll <= 0 {
                    return Err(ConfigError::InvalidOwnable(index));
                }
            } else if cell.price != 0 || cell.toll != 0 {
                return Err(ConfigError::PricedSpecialCell(index));
            }
        }

        for card in &self.chance_cards {
            check_amount(|| format!("Chance card {:?}", card.label), card.delta)?;
        }
        check_amount(|| "Starting cash".to_string(), self.rules.starting_cash)?;
        check_amount(|| "Salary".to_string(), self.rules.salary)?;
        check_amount(|| "Tax".to_string(), self.rules.tax)?;

        let has_chance = self.cells.iter().any(|c| c.kind == CellKind::Chance);
        if has_chance && self.chance_cards.is_empty() {
            return Err(ConfigError::NoChanceCards);
        }

        for p in [self.rules.buy_probability, self.rules.upgrade_probability] {
            if !(0.0..=1.0).contains(&p) {
                return Err(ConfigError::InvalidProbability(p));
            }
        }
        if self.rules.starting_cash <= 0 {
            return Err(ConfigError::InvalidStartingCash);
        }
        if self.rules.salary < 0 || self.rules.tax < 0 {
            return Err(ConfigError::NegativeAmount);
        }

        Ok(())
    }
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self::classic()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classic_board_is_valid() {
        let config = BoardConfig::classic();
        assert_eq!(config.cells.len(), 20);
        assert_eq!(config.chance_cards.len(), 6);
        config.validate().unwrap();
    }

    #[test]
    fn test_classic_rules() {
        let rules = Rules::default();
        assert_eq!(rules.starting_cash, 1_000_000);
        assert_eq!(rules.salary, 100_000);
        assert_eq!(rules.tax, 50_000);
    }

    #[test]
    fn test_json_round_trip_keeps_board() {
        let json = serde_json::to_string(&BoardConfig::classic()).unwrap();
        let parsed = BoardConfig::from_json(&json).unwrap();
        assert_eq!(parsed, BoardConfig::classic());
    }

    #[test]
    fn test_json_defaults_rules() {
        let json = r#"{
            "cells": [
                { "label": "Start", "kind": "start" },
                { "label": "Seoul", "kind": "ownable", "price": 50000, "toll": 25000 },
                { "label": "Island", "kind": "rest" }
            ],
            "chance_cards": []
        }"#;
        let config = BoardConfig::from_json(json).unwrap();
        assert_eq!(config.rules, Rules::default());
        assert_eq!(config.cells[1].price, 50_000);
    }

    #[test]
    fn test_rejects_missing_start() {
        let mut config = BoardConfig::classic();
        config.cells.swap(0, 1);
        assert!(matches!(config.validate(), Err(ConfigError::MissingStart)));
    }

    #[test]
    fn test_rejects_chance_without_cards() {
        let mut config = BoardConfig::classic();
        config.chance_cards.clear();
        assert!(matches!(config.validate(), Err(ConfigError::NoChanceCards)));
    }

    #[test]
    fn test_rejects_free_land() {
        let mut config = BoardConfig::classic();
        config.cells[1].price = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidOwnable(1))
        ));
    }

    #[test]
    fn test_rejects_huge_amounts() {
        let mut config = BoardConfig::classic();
        config.cells[1].price = Money::MAX / 10;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::AmountTooLarge { .. })
        ));

        let mut config = BoardConfig::classic();
        config.cells[2].toll = MAX_AMOUNT + 1;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::AmountTooLarge { .. })
        ));

        let mut config = BoardConfig::classic();
        config.chance_cards[0].delta = Money::MIN;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::AmountTooLarge { .. })
        ));

        let mut config = BoardConfig::classic();
        config.rules.salary = Money::MAX;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::AmountTooLarge { .. })
        ));
    }

    #[test]
    fn test_largest_amounts_stay_in_range() {
        let mut config = BoardConfig::classic();
        config.cells[1].price = MAX_AMOUNT;
        config.cells[1].toll = MAX_AMOUNT;
        config.validate().unwrap();

        let board = crate::board::Board::from_config(&config);
        let mut top = board.cell(1).unwrap().clone();
        top.level = crate::economy::MAX_LEVEL;
        assert_eq!(crate::economy::toll_owed(&top), 4 * MAX_AMOUNT);
        assert!(crate::economy::liquidation_value(&top) > MAX_AMOUNT);
    }

    #[test]
    fn test_rejects_bad_probability() {
        let mut config = BoardConfig::classic();
        config.rules.buy_probability = 1.5;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidProbability(_))
        ));
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(matches!(
            BoardConfig::from_json("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }
}
