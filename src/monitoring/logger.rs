use serde::Serialize;
use tracing::info;

use crate::types::AppConfig;

#[derive(Serialize)]
struct StartupLog<'a> {
    event: &'a str,
    spreadsheet_id: &'a str,
    tables: [&'a str; 3],
    images_folder_id: &'a str,
    token_source: &'a str,
    cache_ttl_secs: u64,
}

pub fn log_startup(cfg: &AppConfig) {
    let token_source = if cfg.google.access_token.as_deref().is_some_and(|t| !t.is_empty()) {
        "static"
    } else {
        "refresh"
    };
    let payload = StartupLog {
        event: "startup",
        spreadsheet_id: &cfg.sheets.spreadsheet_id,
        tables: [
            &cfg.sheets.trades_sheet,
            &cfg.sheets.settings_sheet,
            &cfg.sheets.checklist_sheet,
        ],
        images_folder_id: &cfg.drive.images_folder_id,
        token_source,
        cache_ttl_secs: cfg.journal.cache_ttl_secs,
    };
    info!(target: "journal", startup = serde_json::to_string(&payload).unwrap_or_default().as_str());
}
