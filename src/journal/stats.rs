use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use super::TradeRecord;

/// Number of rows in the "recent activity" panel.
pub const RECENT_LIMIT: usize = 5;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RecentActivity {
    pub date: NaiveDate,
    pub asset: String,
    pub pnl: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DashboardStats {
    pub net_pnl: f64,
    /// Percentage of trades with strictly positive PnL, 0-100.
    pub win_rate: f64,
    pub trade_count: usize,
    /// PnL summed per calendar day, oldest first.
    pub daily_pnl: Vec<(NaiveDate, f64)>,
    pub recent: Vec<RecentActivity>,
}

/// Win rate in percent; zero and negative PnL are both non-wins.
pub fn win_rate(records: &[TradeRecord]) -> f64 {
    if records.is_empty() {
        return 0.0;
    }
    let wins = records.iter().filter(|r| r.is_win()).count();
    wins as f64 / records.len() as f64 * 100.0
}

pub fn daily_pnl(records: &[TradeRecord]) -> Vec<(NaiveDate, f64)> {
    let mut by_day: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for r in records {
        *by_day.entry(r.date).or_insert(0.0) += r.pnl;
    }
    by_day.into_iter().collect()
}

impl DashboardStats {
    pub fn compute(records: &[TradeRecord]) -> Self {
        let mut by_date: Vec<&TradeRecord> = records.iter().collect();
        // Stable sort keeps storage order among trades on the same day.
        by_date.sort_by(|a, b| b.date.cmp(&a.date));
        let recent = by_date
            .into_iter()
            .take(RECENT_LIMIT)
            .map(|r| RecentActivity {
                date: r.date,
                asset: r.asset.clone(),
                pnl: r.pnl,
            })
            .collect();

        Self {
            net_pnl: records.iter().map(|r| r.pnl).sum(),
            win_rate: win_rate(records),
            trade_count: records.len(),
            daily_pnl: daily_pnl(records),
            recent,
        }
    }
}
