use std::time::Duration;

use anyhow::Context;
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

const DEFAULT_SHEETS_BASE_URL: &str = "https://sheets.googleapis.com";
const DEFAULT_DRIVE_BASE_URL: &str = "https://www.googleapis.com";
const DEFAULT_DRIVE_UPLOAD_URL: &str = "https://www.googleapis.com/upload";
const DEFAULT_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

fn default_sheets_base_url() -> String {
    DEFAULT_SHEETS_BASE_URL.to_string()
}

fn default_drive_base_url() -> String {
    DEFAULT_DRIVE_BASE_URL.to_string()
}

fn default_drive_upload_url() -> String {
    DEFAULT_DRIVE_UPLOAD_URL.to_string()
}

fn default_token_url() -> String {
    DEFAULT_TOKEN_URL.to_string()
}

fn default_trades_sheet() -> String {
    "Trades".to_string()
}

fn default_settings_sheet() -> String {
    "Settings".to_string()
}

fn default_checklist_sheet() -> String {
    "ChecklistSchema".to_string()
}

fn default_cache_ttl_secs() -> u64 {
    60
}

fn default_no_account() -> String {
    "-- no account --".to_string()
}

fn default_no_asset() -> String {
    "-- no asset --".to_string()
}

/// Credentials used to obtain bearer tokens for the Google APIs.
///
/// Either a static `access_token` or the refresh-token triple must be set.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct GoogleConfig {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default = "default_token_url")]
    pub token_url: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SheetsConfig {
    pub spreadsheet_id: String,
    #[serde(default = "default_sheets_base_url")]
    pub base_url: String,
    #[serde(default = "default_trades_sheet")]
    pub trades_sheet: String,
    #[serde(default = "default_settings_sheet")]
    pub settings_sheet: String,
    #[serde(default = "default_checklist_sheet")]
    pub checklist_sheet: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DriveConfig {
    /// Folder that holds every screenshot.
    pub images_folder_id: String,
    #[serde(default = "default_drive_base_url")]
    pub base_url: String,
    #[serde(default = "default_drive_upload_url")]
    pub upload_url: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub app_password: Option<String>,
    /// Hex encoded SHA-256 of the shared secret. Takes precedence over `app_password`.
    #[serde(default)]
    pub app_password_sha256: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JournalConfig {
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    #[serde(default = "default_no_account")]
    pub no_account: String,
    #[serde(default = "default_no_asset")]
    pub no_asset: String,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: default_cache_ttl_secs(),
            no_account: default_no_account(),
            no_asset: default_no_asset(),
        }
    }
}

impl JournalConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub google: GoogleConfig,
    pub sheets: SheetsConfig,
    pub drive: DriveConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub journal: JournalConfig,
}

impl AppConfig {
    /// Load the TOML file at `path`, then apply `JOURNAL__SECTION__KEY` environment overrides.
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let cfg = Config::builder()
            .add_source(File::new(path, FileFormat::Toml))
            .add_source(
                Environment::with_prefix("JOURNAL")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()
            .with_context(|| format!("failed to read config file at {path}"))?;
        let cfg: Self = cfg
            .try_deserialize()
            .with_context(|| format!("failed to deserialize config at {path}"))?;
        Ok(cfg)
    }

    pub fn from_toml_str(contents: &str) -> anyhow::Result<Self> {
        let cfg: Self = toml::from_str(contents).context("failed to deserialize TOML config")?;
        Ok(cfg)
    }
}
