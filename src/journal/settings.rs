//! Account and asset pick lists stored as key/value rows.

use indexmap::IndexMap;
use thiserror::Error;

use super::checklist::MoveDirection;

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum PickListKind {
    Accounts,
    Assets,
}

impl PickListKind {
    pub fn key(self) -> &'static str {
        match self {
            PickListKind::Accounts => "accounts",
            PickListKind::Assets => "assets",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PickListError {
    #[error("value must not be empty")]
    Empty,

    #[error("{0} is already in the list")]
    Duplicate(String),

    #[error("{0} is not in the list")]
    NotFound(String),

    #[error("the placeholder entry cannot be changed")]
    Sentinel,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    pub accounts: Vec<String>,
    pub assets: Vec<String>,
    /// Unrecognised keys, kept verbatim so a rewrite does not lose them.
    pub extra: IndexMap<String, String>,
    no_account: String,
    no_asset: String,
}

impl Settings {
    /// Lists used when bootstrapping an empty settings table.
    pub fn initial(no_account: &str, no_asset: &str) -> Self {
        let accounts = [no_account, "Private", "FTMO 12.2025 100K"];
        let assets = [
            no_asset, "NQ", "ES", "DAX", "EURUSD", "GOLD", "GBPJPY", "USDCAD", "CADCHF",
            "YEN BASKET",
        ];
        Self {
            accounts: accounts.iter().map(|s| s.to_string()).collect(),
            assets: assets.iter().map(|s| s.to_string()).collect(),
            extra: IndexMap::new(),
            no_account: no_account.to_string(),
            no_asset: no_asset.to_string(),
        }
    }

    /// Lists used when the table is unreachable or lacks a key.
    pub fn fallback(no_account: &str, no_asset: &str) -> Self {
        Self {
            accounts: vec![no_account.to_string(), "Private".to_string()],
            assets: vec![no_asset.to_string(), "NQ".to_string(), "ES".to_string()],
            extra: IndexMap::new(),
            no_account: no_account.to_string(),
            no_asset: no_asset.to_string(),
        }
    }

    /// Decode `key, value` rows (header first). List values are JSON arrays.
    pub fn from_rows(rows: &[Vec<String>], no_account: &str, no_asset: &str) -> Self {
        let mut settings = Self::fallback(no_account, no_asset);
        for row in rows.iter().skip(1) {
            let key = row.first().map(|s| s.trim()).unwrap_or("");
            let value = row.get(1).map(String::as_str).unwrap_or("");
            if key.is_empty() {
                continue;
            }
            match (key, serde_json::from_str::<Vec<String>>(value)) {
                ("accounts", Ok(list)) => settings.accounts = list,
                ("assets", Ok(list)) => settings.assets = list,
                _ => {
                    settings.extra.insert(key.to_string(), value.to_string());
                }
            }
        }
        settings
    }

    /// Full table contents, header included.
    pub fn to_rows(&self) -> Vec<Vec<String>> {
        let encode = |list: &Vec<String>| serde_json::to_string(list).unwrap_or_else(|_| "[]".into());
        let mut rows = vec![
            vec!["key".to_string(), "value".to_string()],
            vec!["accounts".to_string(), encode(&self.accounts)],
            vec!["assets".to_string(), encode(&self.assets)],
        ];
        rows.extend(
            self.extra
                .iter()
                .filter(|(k, _)| k.as_str() != "accounts" && k.as_str() != "assets")
                .map(|(k, v)| vec![k.clone(), v.clone()]),
        );
        rows
    }

    pub fn sentinel(&self, kind: PickListKind) -> &str {
        match kind {
            PickListKind::Accounts => &self.no_account,
            PickListKind::Assets => &self.no_asset,
        }
    }

    pub fn list(&self, kind: PickListKind) -> &[String] {
        match kind {
            PickListKind::Accounts => &self.accounts,
            PickListKind::Assets => &self.assets,
        }
    }

    fn list_mut(&mut self, kind: PickListKind) -> &mut Vec<String> {
        match kind {
            PickListKind::Accounts => &mut self.accounts,
            PickListKind::Assets => &mut self.assets,
        }
    }

    /// Entries shown in the management view: everything but the sentinel.
    pub fn managed(&self, kind: PickListKind) -> Vec<&str> {
        let sentinel = self.sentinel(kind);
        self.list(kind)
            .iter()
            .map(String::as_str)
            .filter(|v| *v != sentinel)
            .collect()
    }

    pub fn add(&mut self, kind: PickListKind, value: &str) -> Result<(), PickListError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(PickListError::Empty);
        }
        if self.list(kind).iter().any(|v| v == value) {
            return Err(PickListError::Duplicate(value.to_string()));
        }
        self.list_mut(kind).push(value.to_string());
        Ok(())
    }

    pub fn remove(&mut self, kind: PickListKind, value: &str) -> Result<(), PickListError> {
        if value == self.sentinel(kind) {
            return Err(PickListError::Sentinel);
        }
        let list = self.list_mut(kind);
        let pos = list
            .iter()
            .position(|v| v == value)
            .ok_or_else(|| PickListError::NotFound(value.to_string()))?;
        list.remove(pos);
        Ok(())
    }

    /// Swap `value` with its neighbour in the managed view. Returns `false` at the edges.
    pub fn move_entry(
        &mut self,
        kind: PickListKind,
        value: &str,
        direction: MoveDirection,
    ) -> Result<bool, PickListError> {
        if value == self.sentinel(kind) {
            return Err(PickListError::Sentinel);
        }
        let managed: Vec<String> = self.managed(kind).into_iter().map(str::to_string).collect();
        let pos = managed
            .iter()
            .position(|v| v == value)
            .ok_or_else(|| PickListError::NotFound(value.to_string()))?;
        let neighbour = match direction {
            MoveDirection::Up if pos > 0 => &managed[pos - 1],
            MoveDirection::Down if pos + 1 < managed.len() => &managed[pos + 1],
            _ => return Ok(false),
        };
        let list = self.list_mut(kind);
        let a = list.iter().position(|v| v == value);
        let b = list.iter().position(|v| v == neighbour);
        if let (Some(a), Some(b)) = (a, b) {
            list.swap(a, b);
        }
        Ok(true)
    }
}
