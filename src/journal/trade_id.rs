//! Human-readable trade identifiers.
//!
//! Layout: 5-digit zero-padded sequence, normalized asset, trade date as
//! `DDMMYYYY`. Sequence 1, asset `NQ`, 2026-01-04 gives `00001NQ04012026`.

use chrono::NaiveDate;

use crate::utils::time::TRADE_ID_DATE_FORMAT;

pub const SEQUENCE_WIDTH: usize = 5;

/// Placeholder emitted when the asset is the "none" sentinel.
pub const NO_ASSET_PLACEHOLDER: &str = "NONE";

/// Sequence number encoded in the fixed-width prefix, if the prefix is all digits.
pub fn parse_sequence(trade_id: &str) -> Option<u32> {
    let prefix = trade_id.get(..SEQUENCE_WIDTH)?;
    if !prefix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    prefix.parse().ok()
}

/// Next sequence number after the highest valid prefix; malformed identifiers are skipped.
pub fn next_sequence<'a, I>(existing: I) -> u32
where
    I: IntoIterator<Item = &'a str>,
{
    existing
        .into_iter()
        .filter_map(parse_sequence)
        .max()
        .unwrap_or(0)
        + 1
}

fn squash(asset: &str) -> String {
    asset
        .chars()
        .filter(|c| *c != ' ' && *c != '-')
        .collect::<String>()
        .to_uppercase()
}

#[derive(Clone, Debug)]
pub struct TradeIdGenerator {
    no_asset: String,
}

impl TradeIdGenerator {
    /// `no_asset` is the display sentinel for "no asset selected".
    pub fn new(no_asset: impl Into<String>) -> Self {
        Self {
            no_asset: no_asset.into(),
        }
    }

    /// Strip spaces and hyphens and uppercase; the sentinel maps to `NONE`.
    pub fn normalize_asset(&self, asset: &str) -> String {
        let squashed = squash(asset);
        if squashed == squash(&self.no_asset) {
            NO_ASSET_PLACEHOLDER.to_string()
        } else {
            squashed
        }
    }

    pub fn format(&self, sequence: u32, asset: &str, date: NaiveDate) -> String {
        format!(
            "{:0width$}{}{}",
            sequence,
            self.normalize_asset(asset),
            date.format(TRADE_ID_DATE_FORMAT),
            width = SEQUENCE_WIDTH
        )
    }

    /// Derive the identifier for a new trade given every identifier already stored.
    ///
    /// Not atomic on its own: callers must hold the journal's writer lock
    /// between reading `existing` and persisting the result.
    pub fn generate<'a, I>(&self, existing: I, asset: &str, date: NaiveDate) -> String
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.format(next_sequence(existing), asset, date)
    }
}
