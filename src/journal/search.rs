use clap::ValueEnum;

use super::TradeRecord;
use crate::utils::time::week_label;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum SearchField {
    #[default]
    All,
    TradeId,
    Tags,
    Asset,
    Notes,
    Account,
}

impl SearchField {
    fn haystacks(self, r: &TradeRecord) -> Vec<&str> {
        match self {
            SearchField::All => vec![
                r.trade_id.as_str(),
                r.tags.as_str(),
                r.asset.as_str(),
                r.notes.as_str(),
                r.account.as_str(),
            ],
            SearchField::TradeId => vec![r.trade_id.as_str()],
            SearchField::Tags => vec![r.tags.as_str()],
            SearchField::Asset => vec![r.asset.as_str()],
            SearchField::Notes => vec![r.notes.as_str()],
            SearchField::Account => vec![r.account.as_str()],
        }
    }
}

/// Newest first by (date, time).
pub fn sort_newest_first(records: &mut [TradeRecord]) {
    records.sort_by(|a, b| (b.date, b.time).cmp(&(a.date, a.time)));
}

/// Case-insensitive substring match; an empty query matches everything.
pub fn matches(record: &TradeRecord, query: &str, field: SearchField) -> bool {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    field
        .haystacks(record)
        .into_iter()
        .any(|h| h.to_lowercase().contains(&needle))
}

pub fn filter<'a>(
    records: &'a [TradeRecord],
    query: &str,
    field: SearchField,
) -> Vec<&'a TradeRecord> {
    records
        .iter()
        .filter(|r| matches(r, query, field))
        .collect()
}

/// Consecutive runs of records sharing an ISO week, labelled `W{week} / {year}`.
pub fn group_by_week<'a>(records: &[&'a TradeRecord]) -> Vec<(String, Vec<&'a TradeRecord>)> {
    let mut groups: Vec<(String, Vec<&'a TradeRecord>)> = Vec::new();
    for &r in records {
        let label = week_label(r.date);
        if let Some((current, members)) = groups.last_mut() {
            if *current == label {
                members.push(r);
                continue;
            }
        }
        groups.push((label, vec![r]));
    }
    groups
}
