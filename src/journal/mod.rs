use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use clap::ValueEnum;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub mod checklist;
pub mod record;
pub mod search;
pub mod settings;
pub mod stats;
pub mod trade_id;

pub use checklist::{ChecklistItem, ChecklistSchema, MoveDirection, SchemaError};
pub use settings::{PickListError, PickListKind, Settings};
pub use trade_id::TradeIdGenerator;

/// Boolean answers recorded against the checklist schema at save time, keyed by item key.
///
/// Stored by value so later schema edits never rewrite past trades.
pub type ChecklistSnapshot = IndexMap<String, bool>;

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, ValueEnum)]
pub enum Direction {
    #[default]
    Long,
    Short,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Long => f.write_str("Long"),
            Direction::Short => f.write_str("Short"),
        }
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "long" => Ok(Direction::Long),
            "short" => Ok(Direction::Short),
            other => Err(format!("unknown direction: {other}")),
        }
    }
}

/// One logged trade.
///
/// `id`, `trade_id` and `created_at` are assigned on creation and never
/// rewritten by an edit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub id: String,
    pub trade_id: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub account: String,
    pub asset: String,
    pub direction: Direction,
    pub pnl: f64,
    pub notes: String,
    /// Free-text, comma separated labels.
    pub tags: String,
    pub checklist: ChecklistSnapshot,
    pub reviewed: bool,
    pub created_at: Option<NaiveDateTime>,
}

impl TradeRecord {
    pub fn is_win(&self) -> bool {
        self.pnl > 0.0
    }
}

/// User input for a new trade, before identifiers are assigned.
#[derive(Clone, Debug, PartialEq)]
pub struct TradeDraft {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub account: String,
    pub asset: String,
    pub direction: Direction,
    pub pnl: f64,
    pub notes: String,
    pub tags: String,
    pub checklist: ChecklistSnapshot,
}

impl From<TradeDraft> for TradeRecord {
    fn from(d: TradeDraft) -> Self {
        Self {
            id: String::new(),
            trade_id: String::new(),
            date: d.date,
            time: d.time,
            account: d.account,
            asset: d.asset,
            direction: d.direction,
            pnl: d.pnl,
            notes: d.notes,
            tags: d.tags,
            checklist: d.checklist,
            reviewed: false,
            created_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_parses_case_insensitively() {
        assert_eq!("long".parse::<Direction>().unwrap(), Direction::Long);
        assert_eq!(" SHORT ".parse::<Direction>().unwrap(), Direction::Short);
        assert!("flat".parse::<Direction>().is_err());
        assert_eq!(Direction::Short.to_string(), "Short");
    }
}
