use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::client::{ClientError, ClientResult};

pub mod attachments;
pub mod cache;
pub mod journal_store;

/// Remote tabular store with first-row-as-header tables.
///
/// Row numbers are 1-based and include the header row, so the first data
/// row is row 2.
#[allow(async_fn_in_trait)]
pub trait TabularStore {
    /// Create `table` when it does not exist yet. Returns `true` if it was created.
    async fn ensure_table(&self, table: &str) -> ClientResult<bool>;

    async fn read_all_rows(&self, table: &str) -> ClientResult<Vec<Vec<String>>>;

    async fn append_row(&self, table: &str, row: &[String]) -> ClientResult<()>;

    async fn delete_row(&self, table: &str, row_number: usize) -> ClientResult<()>;

    /// Read a single A1-notation cell, `None` when it is empty.
    async fn read_cell(&self, table: &str, cell: &str) -> ClientResult<Option<String>>;

    /// Overwrite the rectangle starting at `start_cell` with `rows`.
    async fn write_range(&self, table: &str, start_cell: &str, rows: &[Vec<String>])
        -> ClientResult<()>;

    async fn clear(&self, table: &str) -> ClientResult<()>;

    async fn update_row(&self, table: &str, row_number: usize, row: &[String]) -> ClientResult<()> {
        self.write_range(table, &a1_cell(row_number, 1), &[row.to_vec()])
            .await
    }

    async fn update_cell(
        &self,
        table: &str,
        row_number: usize,
        column: usize,
        value: &str,
    ) -> ClientResult<()> {
        self.write_range(table, &a1_cell(row_number, column), &[vec![value.to_string()]])
            .await
    }
}

/// File as seen by the remote file store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFile {
    pub id: String,
    pub name: String,
}

/// Remote file store scoped to a single folder.
#[allow(async_fn_in_trait)]
pub trait FileStore {
    async fn create_file(&self, name: &str, mime_type: &str, bytes: Vec<u8>)
        -> ClientResult<RemoteFile>;

    /// Grant anyone-with-the-link read access.
    async fn make_public(&self, file_id: &str) -> ClientResult<()>;

    /// Files whose name contains `needle`.
    async fn list_by_name(&self, needle: &str) -> ClientResult<Vec<RemoteFile>>;

    async fn delete_file(&self, file_id: &str) -> ClientResult<()>;

    /// Direct-view URL for a public file.
    fn view_url(&self, file_id: &str) -> String {
        format!("https://drive.google.com/uc?id={file_id}")
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("client error: {0}")]
    Client(#[from] ClientError),

    #[error("table {0} has no header row")]
    MissingHeader(String),

    #[error("column {column} missing from table {table}")]
    MissingColumn { table: String, column: String },
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Convert a 1-based (row, column) pair into A1 notation, e.g. `(2, 28)` -> `AB2`.
pub fn a1_cell(row: usize, column: usize) -> String {
    let mut letters = Vec::new();
    let mut n = column.max(1);
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push((b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    let col: String = letters.into_iter().rev().collect();
    format!("{col}{row}")
}
