//! Trade rows, settings and checklist schema on top of a [`TabularStore`].
//!
//! This layer performs single remote operations and never touches a read
//! cache; callers own cache invalidation and write serialization.

use chrono::NaiveDate;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::journal::record::{
    decode_table, encode_bool, encode_cell, encode_row, header_index, IMMUTABLE_COLUMNS, TRADE_HEADERS,
};
use crate::journal::{ChecklistSchema, Settings, TradeIdGenerator, TradeRecord};
use crate::types::{JournalConfig, SheetsConfig};
use crate::utils::time::now_local;

use super::{StoreError, StoreResult, TabularStore};

/// Cell of the schema table holding the JSON document.
pub const SCHEMA_CELL: &str = "A2";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SaveMode {
    Create,
    Edit,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SaveOutcome {
    /// New row appended; carries the record with its assigned identifiers.
    Created(TradeRecord),
    Updated,
    /// No row with the given surrogate id; nothing was written.
    NotFound,
}

#[derive(Clone, Debug)]
pub struct TableNames {
    pub trades: String,
    pub settings: String,
    pub checklist: String,
}

impl From<&SheetsConfig> for TableNames {
    fn from(cfg: &SheetsConfig) -> Self {
        Self {
            trades: cfg.trades_sheet.clone(),
            settings: cfg.settings_sheet.clone(),
            checklist: cfg.checklist_sheet.clone(),
        }
    }
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            trades: "Trades".to_string(),
            settings: "Settings".to_string(),
            checklist: "ChecklistSchema".to_string(),
        }
    }
}

pub struct JournalStore<S> {
    store: S,
    tables: TableNames,
    ids: TradeIdGenerator,
    no_account: String,
    no_asset: String,
}

impl<S: TabularStore> JournalStore<S> {
    pub fn new(store: S, tables: TableNames, journal: &JournalConfig) -> Self {
        Self {
            store,
            tables,
            ids: TradeIdGenerator::new(journal.no_asset.clone()),
            no_account: journal.no_account.clone(),
            no_asset: journal.no_asset.clone(),
        }
    }

    pub fn inner(&self) -> &S {
        &self.store
    }

    pub fn id_generator(&self) -> &TradeIdGenerator {
        &self.ids
    }

    /// Create missing tables and seed headers and defaults into empty ones.
    pub async fn ensure_layout(&self) -> StoreResult<()> {
        let t = &self.tables;
        for table in [&t.trades, &t.settings, &t.checklist] {
            self.store.ensure_table(table).await?;
        }

        if self.store.read_all_rows(&t.trades).await?.is_empty() {
            let header: Vec<String> = TRADE_HEADERS.iter().map(|h| h.to_string()).collect();
            self.store.write_range(&t.trades, "A1", &[header]).await?;
            info!(target: "store", table = %t.trades, "trades header written");
        }

        if self.store.read_all_rows(&t.settings).await?.is_empty() {
            self.save_settings(&Settings::initial(&self.no_account, &self.no_asset))
                .await?;
            info!(target: "store", table = %t.settings, "default settings written");
        }

        if self.store.read_cell(&t.checklist, SCHEMA_CELL).await?.is_none() {
            self.store
                .write_range(&t.checklist, "A1", &[vec!["schema_json".to_string()]])
                .await?;
            self.save_schema(&ChecklistSchema::default_schema()).await?;
            info!(target: "store", table = %t.checklist, "default checklist schema written");
        }
        Ok(())
    }

    pub async fn load_trades(&self) -> StoreResult<Vec<TradeRecord>> {
        let rows = self.store.read_all_rows(&self.tables.trades).await?;
        let records = decode_table(&rows);
        debug!(target: "store", records = records.len(), "trades loaded");
        Ok(records)
    }

    pub async fn load_settings(&self) -> StoreResult<Settings> {
        let rows = self.store.read_all_rows(&self.tables.settings).await?;
        Ok(Settings::from_rows(&rows, &self.no_account, &self.no_asset))
    }

    /// Settings used when the remote table cannot be read.
    pub fn fallback_settings(&self) -> Settings {
        Settings::fallback(&self.no_account, &self.no_asset)
    }

    /// Clear the settings table and rewrite it in full.
    pub async fn save_settings(&self, settings: &Settings) -> StoreResult<()> {
        self.store.clear(&self.tables.settings).await?;
        self.store
            .write_range(&self.tables.settings, "A1", &settings.to_rows())
            .await?;
        Ok(())
    }

    /// Missing, malformed or empty documents yield the default schema.
    pub async fn load_schema(&self) -> StoreResult<ChecklistSchema> {
        let cell = self
            .store
            .read_cell(&self.tables.checklist, SCHEMA_CELL)
            .await?;
        let schema = match cell.as_deref().map(ChecklistSchema::from_json) {
            Some(Ok(schema)) if !schema.is_empty() => schema,
            Some(Err(e)) => {
                warn!(target: "store", error = %e, "checklist schema is not valid JSON, using defaults");
                ChecklistSchema::default_schema()
            }
            _ => ChecklistSchema::default_schema(),
        };
        Ok(schema)
    }

    pub async fn save_schema(&self, schema: &ChecklistSchema) -> StoreResult<()> {
        self.store
            .write_range(&self.tables.checklist, SCHEMA_CELL, &[vec![schema.to_json()]])
            .await?;
        Ok(())
    }

    /// Identifier the next created trade would receive.
    pub async fn next_trade_id(&self, asset: &str, date: NaiveDate) -> StoreResult<String> {
        let rows = self.store.read_all_rows(&self.tables.trades).await?;
        Ok(self.trade_id_from_rows(&rows, asset, date))
    }

    /// Scans the raw `trade_id` column, including rows that do not decode
    /// into a record.
    fn trade_id_from_rows(&self, rows: &[Vec<String>], asset: &str, date: NaiveDate) -> String {
        let column = rows
            .first()
            .and_then(|header| header_index(header).get("trade_id").copied());
        let existing = rows
            .iter()
            .skip(1)
            .filter_map(|row| column.and_then(|c| row.get(c)))
            .map(String::as_str);
        self.ids.generate(existing, asset, date)
    }

    async fn table_with_header(&self) -> StoreResult<(Vec<String>, Vec<Vec<String>>)> {
        let mut rows = self.store.read_all_rows(&self.tables.trades).await?;
        if rows.is_empty() {
            return Err(StoreError::MissingHeader(self.tables.trades.clone()));
        }
        let header = rows.remove(0);
        Ok((header, rows))
    }

    fn column(&self, header: &[String], name: &str) -> StoreResult<usize> {
        header
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| StoreError::MissingColumn {
                table: self.tables.trades.clone(),
                column: name.to_string(),
            })
    }

    /// 1-based row number of the row whose `id` cell equals `id`.
    fn locate(id_col: usize, rows: &[Vec<String>], id: &str) -> Option<usize> {
        rows.iter()
            .position(|r| r.get(id_col).map(String::as_str) == Some(id))
            .map(|i| i + 2)
    }

    /// Create or overwrite a trade row.
    ///
    /// `Create` assigns a fresh surrogate id and trade identifier, stamps
    /// `created_at` when absent and appends. `Edit` rewrites the row matching
    /// `record.id` in the table's column order, copying `id`, `trade_id` and
    /// `created_at` from the stored row.
    pub async fn save(&self, record: TradeRecord, mode: SaveMode) -> StoreResult<SaveOutcome> {
        match mode {
            SaveMode::Create => Ok(SaveOutcome::Created(self.create(record).await?)),
            SaveMode::Edit => Ok(if self.update(&record).await? {
                SaveOutcome::Updated
            } else {
                SaveOutcome::NotFound
            }),
        }
    }

    /// Append `record` with freshly assigned `id`, `trade_id` and `created_at`.
    pub async fn create(&self, mut record: TradeRecord) -> StoreResult<TradeRecord> {
        let rows = self.store.read_all_rows(&self.tables.trades).await?;
        let header: Vec<String> = match rows.first() {
            Some(h) if !h.is_empty() => h.clone(),
            _ => {
                let h: Vec<String> = TRADE_HEADERS.iter().map(|h| h.to_string()).collect();
                self.store
                    .write_range(&self.tables.trades, "A1", &[h.clone()])
                    .await?;
                h
            }
        };
        record.id = Uuid::new_v4().to_string();
        record.trade_id = self.trade_id_from_rows(&rows, &record.asset, record.date);
        if record.created_at.is_none() {
            record.created_at = Some(now_local());
        }

        let row = encode_row(&record, &header);
        self.store.append_row(&self.tables.trades, &row).await?;
        info!(target: "store", id = %record.id, trade_id = %record.trade_id, "trade appended");
        Ok(record)
    }

    /// Rewrite the row of `record.id`. Returns `false` when no such row exists.
    pub async fn update(&self, record: &TradeRecord) -> StoreResult<bool> {
        let (header, rows) = self.table_with_header().await?;
        let id_col = self.column(&header, "id")?;
        let Some(row_number) = Self::locate(id_col, &rows, &record.id) else {
            warn!(target: "store", id = %record.id, "edit target not found");
            return Ok(false);
        };
        let stored = &rows[row_number - 2];

        let row: Vec<String> = header
            .iter()
            .enumerate()
            .map(|(i, h)| {
                let h = h.trim();
                if IMMUTABLE_COLUMNS.contains(&h) {
                    stored.get(i).cloned().unwrap_or_default()
                } else {
                    encode_cell(record, h)
                }
            })
            .collect();
        self.store
            .update_row(&self.tables.trades, row_number, &row)
            .await?;
        info!(target: "store", id = %record.id, row = row_number, "trade row rewritten");
        Ok(true)
    }

    /// Remove the row with surrogate id `id`. Returns `false` when absent.
    pub async fn delete(&self, id: &str) -> StoreResult<bool> {
        let (header, rows) = self.table_with_header().await?;
        let id_col = self.column(&header, "id")?;
        match Self::locate(id_col, &rows, id) {
            Some(row_number) => {
                self.store.delete_row(&self.tables.trades, row_number).await?;
                info!(target: "store", id = %id, row = row_number, "trade row deleted");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Rewrite only the `reviewed` cell. Returns `false` when the id is absent.
    pub async fn set_reviewed(&self, id: &str, reviewed: bool) -> StoreResult<bool> {
        let (header, rows) = self.table_with_header().await?;
        let index = header_index(&header);
        let id_col = self.column(&header, "id")?;
        let reviewed_col = *index.get("reviewed").ok_or_else(|| StoreError::MissingColumn {
            table: self.tables.trades.clone(),
            column: "reviewed".to_string(),
        })?;
        match Self::locate(id_col, &rows, id) {
            Some(row_number) => {
                self.store
                    .update_cell(
                        &self.tables.trades,
                        row_number,
                        reviewed_col + 1,
                        encode_bool(reviewed),
                    )
                    .await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
