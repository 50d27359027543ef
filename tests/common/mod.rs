#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use chrono::{NaiveDate, NaiveTime};
use trade_journal::app::JournalApp;
use trade_journal::client::{ClientError, ClientResult};
use trade_journal::journal::{ChecklistSnapshot, Direction, TradeDraft};
use trade_journal::storage::attachments::AttachmentStore;
use trade_journal::storage::journal_store::{JournalStore, TableNames};
use trade_journal::storage::{FileStore, RemoteFile, TabularStore};
use trade_journal::types::JournalConfig;

/// Split an A1 reference like `B12` into 1-based (row, column).
fn parse_a1(cell: &str) -> (usize, usize) {
    let letters: String = cell.chars().take_while(|c| c.is_ascii_alphabetic()).collect();
    let digits = &cell[letters.len()..];
    let column = letters
        .bytes()
        .fold(0usize, |acc, b| acc * 26 + (b.to_ascii_uppercase() - b'A' + 1) as usize);
    (digits.parse().unwrap_or(1), column.max(1))
}

/// In-memory spreadsheet with header-first tables.
#[derive(Default)]
pub struct MemorySheet {
    tables: Mutex<HashMap<String, Vec<Vec<String>>>>,
    offline: AtomicBool,
}

impl MemorySheet {
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn rows(&self, table: &str) -> Vec<Vec<String>> {
        self.tables
            .lock()
            .unwrap()
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    pub fn put_rows(&self, table: &str, rows: Vec<Vec<String>>) {
        self.tables.lock().unwrap().insert(table.to_string(), rows);
    }

    fn check(&self) -> ClientResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(ClientError::Remote("offline".to_string()));
        }
        Ok(())
    }

    fn with_table<R>(
        &self,
        table: &str,
        f: impl FnOnce(&mut Vec<Vec<String>>) -> R,
    ) -> ClientResult<R> {
        self.check()?;
        let mut tables = self.tables.lock().unwrap();
        let rows = tables
            .get_mut(table)
            .ok_or_else(|| ClientError::TableNotFound(table.to_string()))?;
        Ok(f(rows))
    }
}

impl TabularStore for MemorySheet {
    async fn ensure_table(&self, table: &str) -> ClientResult<bool> {
        self.check()?;
        let mut tables = self.tables.lock().unwrap();
        if tables.contains_key(table) {
            return Ok(false);
        }
        tables.insert(table.to_string(), Vec::new());
        Ok(true)
    }

    async fn read_all_rows(&self, table: &str) -> ClientResult<Vec<Vec<String>>> {
        self.with_table(table, |rows| rows.clone())
    }

    async fn append_row(&self, table: &str, row: &[String]) -> ClientResult<()> {
        self.with_table(table, |rows| rows.push(row.to_vec()))
    }

    async fn delete_row(&self, table: &str, row_number: usize) -> ClientResult<()> {
        self.with_table(table, |rows| {
            if row_number >= 1 && row_number <= rows.len() {
                rows.remove(row_number - 1);
            }
        })
    }

    async fn read_cell(&self, table: &str, cell: &str) -> ClientResult<Option<String>> {
        let (row, col) = parse_a1(cell);
        self.with_table(table, |rows| {
            rows.get(row - 1)
                .and_then(|r| r.get(col - 1))
                .filter(|v| !v.is_empty())
                .cloned()
        })
    }

    async fn write_range(
        &self,
        table: &str,
        start_cell: &str,
        values: &[Vec<String>],
    ) -> ClientResult<()> {
        let (row0, col0) = parse_a1(start_cell);
        self.with_table(table, |rows| {
            for (i, values_row) in values.iter().enumerate() {
                let r = row0 - 1 + i;
                while rows.len() <= r {
                    rows.push(Vec::new());
                }
                for (j, v) in values_row.iter().enumerate() {
                    let c = col0 - 1 + j;
                    let target = &mut rows[r];
                    while target.len() <= c {
                        target.push(String::new());
                    }
                    target[c] = v.clone();
                }
            }
        })
    }

    async fn clear(&self, table: &str) -> ClientResult<()> {
        self.with_table(table, |rows| rows.clear())
    }
}

/// In-memory file folder with optional upload, sharing and listing failures.
#[derive(Default)]
pub struct MemoryDrive {
    files: Mutex<Vec<(RemoteFile, String, bool)>>,
    next_id: AtomicU32,
    fail_uploads: AtomicBool,
    fail_sharing: AtomicBool,
    fail_listing: AtomicBool,
}

impl MemoryDrive {
    pub fn fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_sharing(&self, fail: bool) {
        self.fail_sharing.store(fail, Ordering::SeqCst);
    }

    pub fn fail_listing(&self, fail: bool) {
        self.fail_listing.store(fail, Ordering::SeqCst);
    }

    /// Insert a file directly, bypassing upload.
    pub fn seed(&self, name: &str) -> String {
        let id = format!("seed-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        self.files.lock().unwrap().push((
            RemoteFile {
                id: id.clone(),
                name: name.to_string(),
            },
            "image/png".to_string(),
            true,
        ));
        id
    }

    pub fn names(&self) -> Vec<String> {
        self.files
            .lock()
            .unwrap()
            .iter()
            .map(|(f, _, _)| f.name.clone())
            .collect()
    }

    pub fn mime_of(&self, name: &str) -> Option<String> {
        self.files
            .lock()
            .unwrap()
            .iter()
            .find(|(f, _, _)| f.name == name)
            .map(|(_, m, _)| m.clone())
    }

    pub fn is_public(&self, name: &str) -> bool {
        self.files
            .lock()
            .unwrap()
            .iter()
            .any(|(f, _, public)| f.name == name && *public)
    }
}

impl FileStore for MemoryDrive {
    async fn create_file(
        &self,
        name: &str,
        mime_type: &str,
        _bytes: Vec<u8>,
    ) -> ClientResult<RemoteFile> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(ClientError::Remote("quota exceeded".to_string()));
        }
        let file = RemoteFile {
            id: format!("file-{}", self.next_id.fetch_add(1, Ordering::SeqCst)),
            name: name.to_string(),
        };
        self.files
            .lock()
            .unwrap()
            .push((file.clone(), mime_type.to_string(), false));
        Ok(file)
    }

    async fn make_public(&self, file_id: &str) -> ClientResult<()> {
        if self.fail_sharing.load(Ordering::SeqCst) {
            return Err(ClientError::Remote("permission denied".to_string()));
        }
        let mut files = self.files.lock().unwrap();
        let entry = files
            .iter_mut()
            .find(|(f, _, _)| f.id == file_id)
            .ok_or_else(|| ClientError::Remote(format!("no file {file_id}")))?;
        entry.2 = true;
        Ok(())
    }

    async fn list_by_name(&self, needle: &str) -> ClientResult<Vec<RemoteFile>> {
        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(ClientError::Remote("listing failed".to_string()));
        }
        Ok(self
            .files
            .lock()
            .unwrap()
            .iter()
            .filter(|(f, _, _)| f.name.contains(needle))
            .map(|(f, _, _)| f.clone())
            .collect())
    }

    async fn delete_file(&self, file_id: &str) -> ClientResult<()> {
        let mut files = self.files.lock().unwrap();
        let before = files.len();
        files.retain(|(f, _, _)| f.id != file_id);
        if files.len() == before {
            return Err(ClientError::Remote(format!("no file {file_id}")));
        }
        Ok(())
    }
}

pub fn journal_config() -> JournalConfig {
    JournalConfig::default()
}

pub fn journal_store() -> JournalStore<MemorySheet> {
    JournalStore::new(MemorySheet::default(), TableNames::default(), &journal_config())
}

pub type TestApp = JournalApp<MemorySheet, MemoryDrive>;

pub fn app_with_ttl(ttl: Duration) -> TestApp {
    JournalApp::new(
        journal_store(),
        AttachmentStore::new(MemoryDrive::default()),
        ttl,
    )
}

pub async fn initialised_app() -> TestApp {
    let app = app_with_ttl(Duration::from_secs(60));
    app.init().await.unwrap();
    app
}

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn draft(asset: &str, date: NaiveDate, pnl: f64) -> TradeDraft {
    TradeDraft {
        date,
        time: NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
        account: "Private".to_string(),
        asset: asset.to_string(),
        direction: Direction::Long,
        pnl,
        notes: "first pullback".to_string(),
        tags: "A+, trend".to_string(),
        checklist: ChecklistSnapshot::from([
            ("m_long".to_string(), true),
            ("m_short".to_string(), false),
        ]),
    }
}
