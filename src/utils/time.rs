use chrono::{Datelike, Local, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

/// Canonical date encoding used in the trades table.
pub const DATE_FORMAT: &str = "%Y-%m-%d";
/// Canonical time-of-day encoding used in the trades table.
pub const TIME_FORMAT: &str = "%H:%M";
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
/// Date layout embedded in trade identifiers (day, month, 4-digit year).
pub const TRADE_ID_DATE_FORMAT: &str = "%d%m%Y";

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn format_time(time: NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

pub fn format_timestamp(ts: NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a stored date. Accepts the canonical form or a timestamp starting with it.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .ok()
        .or_else(|| s.get(..10).and_then(|d| NaiveDate::parse_from_str(d, DATE_FORMAT).ok()))
}

/// Parse a stored time of day; seconds are accepted and dropped.
pub fn parse_time(s: &str) -> Option<NaiveTime> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, TIME_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .ok()
        .and_then(|t| NaiveTime::from_hms_opt(t.hour(), t.minute(), 0))
}

pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s.trim(), TIMESTAMP_FORMAT).ok()
}

/// Local wall-clock time truncated to whole seconds.
pub fn now_local() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}

/// ISO calendar week label, e.g. `W1 / 2026`.
pub fn week_label(date: NaiveDate) -> String {
    let iso = date.iso_week();
    format!("W{} / {}", iso.week(), iso.year())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_round_trip() {
        let d = NaiveDate::from_ymd_opt(2026, 1, 4).unwrap();
        assert_eq!(format_date(d), "2026-01-04");
        assert_eq!(parse_date("2026-01-04"), Some(d));
        assert_eq!(parse_date("2026-01-04 09:15:00"), Some(d));
        assert_eq!(parse_date("04.01.2026"), None);

        let t = NaiveTime::from_hms_opt(9, 5, 0).unwrap();
        assert_eq!(format_time(t), "09:05");
        assert_eq!(parse_time("09:05"), Some(t));
        assert_eq!(parse_time("09:05:59"), Some(t));
        assert_eq!(parse_time("later"), None);
    }

    #[test]
    fn week_label_uses_iso_year() {
        // 2026-01-01 is a Thursday, so it belongs to ISO week 1 of 2026.
        let d = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        assert_eq!(week_label(d), "W1 / 2026");
        // 2027-01-01 is a Friday and still belongs to week 53 of 2026.
        let d = NaiveDate::from_ymd_opt(2027, 1, 1).unwrap();
        assert_eq!(week_label(d), "W53 / 2026");
    }
}
