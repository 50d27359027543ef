//! Plain-text rendering for the command line.

use std::fmt::Write as _;

use crate::journal::stats::DashboardStats;
use crate::journal::{ChecklistSchema, PickListKind, Settings, TradeRecord};
use crate::storage::attachments::Attachment;
use crate::utils::time::{format_date, format_time, format_timestamp};

const TRADE_ID_DISPLAY_WIDTH: usize = 15;

fn shorten(trade_id: &str) -> String {
    if trade_id.is_empty() {
        return "N/A".to_string();
    }
    if trade_id.chars().count() > TRADE_ID_DISPLAY_WIDTH {
        let head: String = trade_id.chars().take(TRADE_ID_DISPLAY_WIDTH).collect();
        format!("{head}...")
    } else {
        trade_id.to_string()
    }
}

fn pnl_marker(pnl: f64) -> &'static str {
    if pnl >= 0.0 {
        "+"
    } else {
        "-"
    }
}

/// One-line summary used in the journal listing.
pub fn summary_line(r: &TradeRecord) -> String {
    let status = if r.reviewed { "[x]" } else { "[ ]" };
    format!(
        "{status} [{}] {} {} | {} | {} {} | {} {:.2} $",
        shorten(&r.trade_id),
        r.asset,
        r.direction,
        r.account,
        format_date(r.date),
        format_time(r.time),
        pnl_marker(r.pnl),
        r.pnl,
    )
}

/// Full record with its checklist answers laid out against the current schema.
pub fn details(r: &TradeRecord, schema: &ChecklistSchema, attachments: &[Attachment]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", summary_line(r));
    let _ = writeln!(out, "  id:         {}", r.id);
    let _ = writeln!(out, "  trade id:   {}", r.trade_id);
    if let Some(ts) = r.created_at {
        let _ = writeln!(out, "  created at: {}", format_timestamp(ts));
    }
    let notes = if r.notes.is_empty() { "- none -" } else { r.notes.as_str() };
    let _ = writeln!(out, "  notes:      {notes}");
    let tags = if r.tags.is_empty() { "-" } else { r.tags.as_str() };
    let _ = writeln!(out, "  tags:       {tags}");

    for category in schema.categories() {
        let _ = writeln!(out, "  {category}");
        for (key, item) in schema.sorted_items(category) {
            let mark = if r.checklist.get(key).copied().unwrap_or(false) {
                "[x]"
            } else {
                "[ ]"
            };
            let _ = writeln!(out, "    {mark} {}", item.label);
        }
    }

    if !attachments.is_empty() {
        let _ = writeln!(out, "  screenshots:");
        for a in attachments {
            let _ = writeln!(out, "    {} {} ({})", a.name, a.url, a.id);
        }
    }
    out
}

pub fn dashboard(stats: &DashboardStats) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Net P&L   {:.2} $", stats.net_pnl);
    let _ = writeln!(out, "Win rate  {:.1} %", stats.win_rate);
    let _ = writeln!(out, "Trades    {}", stats.trade_count);
    if !stats.daily_pnl.is_empty() {
        let _ = writeln!(out, "\nDaily P&L");
        for (day, pnl) in &stats.daily_pnl {
            let _ = writeln!(out, "  {} {:>10.2}", format_date(*day), pnl);
        }
    }
    if !stats.recent.is_empty() {
        let _ = writeln!(out, "\nRecent activity");
        for a in &stats.recent {
            let _ = writeln!(out, "  {} {:<12} {:>10.2}", format_date(a.date), a.asset, a.pnl);
        }
    }
    out
}

pub fn schema(schema: &ChecklistSchema) -> String {
    let mut out = String::new();
    for category in schema.categories() {
        let _ = writeln!(out, "{category}");
        for (key, item) in schema.sorted_items(category) {
            let _ = write!(out, "  {:>3}  {key:<12} {}", item.order, item.label);
            if !item.description.is_empty() {
                let _ = write!(out, " - {}", item.description);
            }
            out.push('\n');
        }
    }
    out
}

pub fn settings(settings: &Settings) -> String {
    let mut out = String::new();
    for kind in [PickListKind::Accounts, PickListKind::Assets] {
        let _ = writeln!(out, "{}", kind.key());
        for value in settings.managed(kind) {
            let _ = writeln!(out, "  {value}");
        }
    }
    out
}
