//! Row codec between [`TradeRecord`] and the string cells of the trades table.
//!
//! Columns are matched by header name, so the physical column order of the
//! table is preserved on rewrite.

use std::collections::HashMap;

use tracing::warn;

use super::{ChecklistSnapshot, Direction, TradeRecord};
use crate::utils::time::{
    format_date, format_time, format_timestamp, parse_date, parse_time, parse_timestamp,
};

pub const TRADE_HEADERS: [&str; 13] = [
    "id",
    "trade_id",
    "date",
    "time",
    "account",
    "asset",
    "direction",
    "pnl",
    "notes",
    "tags",
    "checklist",
    "reviewed",
    "created_at",
];

/// Columns an edit copies from the stored row instead of the caller's record.
pub const IMMUTABLE_COLUMNS: [&str; 3] = ["id", "trade_id", "created_at"];

pub fn encode_bool(b: bool) -> &'static str {
    if b {
        "True"
    } else {
        "False"
    }
}

pub fn decode_bool(s: &str) -> bool {
    s.trim().eq_ignore_ascii_case("true")
}

/// Malformed or empty JSON decodes to an empty snapshot.
pub fn decode_checklist(s: &str) -> ChecklistSnapshot {
    if s.trim().is_empty() {
        return ChecklistSnapshot::new();
    }
    serde_json::from_str(s).unwrap_or_default()
}

pub fn encode_checklist(snapshot: &ChecklistSnapshot) -> String {
    serde_json::to_string(snapshot).unwrap_or_else(|_| "{}".to_string())
}

/// Canonical string value of one column.
pub fn encode_cell(record: &TradeRecord, column: &str) -> String {
    match column {
        "id" => record.id.clone(),
        "trade_id" => record.trade_id.clone(),
        "date" => format_date(record.date),
        "time" => format_time(record.time),
        "account" => record.account.clone(),
        "asset" => record.asset.clone(),
        "direction" => record.direction.to_string(),
        "pnl" => record.pnl.to_string(),
        "notes" => record.notes.clone(),
        "tags" => record.tags.clone(),
        "checklist" => encode_checklist(&record.checklist),
        "reviewed" => encode_bool(record.reviewed).to_string(),
        "created_at" => record.created_at.map(format_timestamp).unwrap_or_default(),
        _ => String::new(),
    }
}

/// Encode `record` following the order of `headers`; unknown headers get empty cells.
pub fn encode_row<S: AsRef<str>>(record: &TradeRecord, headers: &[S]) -> Vec<String> {
    headers
        .iter()
        .map(|h| encode_cell(record, h.as_ref().trim()))
        .collect()
}

/// Header name -> column index.
pub fn header_index(headers: &[String]) -> HashMap<&str, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(i, h)| (h.trim(), i))
        .collect()
}

/// Decode one data row. Rows without a parseable date or without an id are skipped.
pub fn decode_row(index: &HashMap<&str, usize>, row: &[String]) -> Option<TradeRecord> {
    let cell = |name: &str| -> &str {
        index
            .get(name)
            .and_then(|&i| row.get(i))
            .map(String::as_str)
            .unwrap_or("")
    };

    let id = cell("id");
    if id.is_empty() {
        return None;
    }
    let Some(date) = parse_date(cell("date")) else {
        warn!(target: "store", id = %id, date = %cell("date"), "skipping row with unparseable date");
        return None;
    };

    Some(TradeRecord {
        id: id.to_string(),
        trade_id: cell("trade_id").to_string(),
        date,
        time: parse_time(cell("time")).unwrap_or_default(),
        account: cell("account").to_string(),
        asset: cell("asset").to_string(),
        direction: cell("direction").parse().unwrap_or(Direction::Long),
        pnl: cell("pnl").trim().parse().unwrap_or(0.0),
        notes: cell("notes").to_string(),
        tags: cell("tags").to_string(),
        checklist: decode_checklist(cell("checklist")),
        reviewed: decode_bool(cell("reviewed")),
        created_at: parse_timestamp(cell("created_at")),
    })
}

/// Decode a whole table (header row first).
pub fn decode_table(rows: &[Vec<String>]) -> Vec<TradeRecord> {
    let Some((headers, data)) = rows.split_first() else {
        return Vec::new();
    };
    let index = header_index(headers);
    data.iter().filter_map(|row| decode_row(&index, row)).collect()
}
