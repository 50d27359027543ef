//! Google Sheets v4 client backing the [`TabularStore`] trait.
//!
//! Every value is written with `valueInputOption=RAW`, so cells hold the
//! exact strings produced by the row codec and are read back verbatim.

use reqwest::{Method, Url};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::storage::TabularStore;
use crate::types::SheetsConfig;

use super::google::GoogleHttp;
use super::{ClientError, ClientResult};

#[derive(Debug, Deserialize)]
struct SheetProperties {
    #[serde(rename = "sheetId")]
    sheet_id: i64,
    title: String,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Serialize)]
struct ValueRangeBody<'a> {
    range: &'a str,
    #[serde(rename = "majorDimension")]
    major_dimension: &'a str,
    values: &'a [Vec<String>],
}

pub struct SheetsClient {
    http: GoogleHttp,
    base_url: String,
    spreadsheet_id: String,
}

impl SheetsClient {
    pub fn new(http: GoogleHttp, cfg: &SheetsConfig) -> Self {
        Self {
            http,
            base_url: cfg.base_url.clone(),
            spreadsheet_id: cfg.spreadsheet_id.clone(),
        }
    }

    fn url(&self, segments: &[&str]) -> ClientResult<String> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ClientError::Config(format!("invalid sheets base_url: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| ClientError::Config("sheets base_url cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets"])
            .extend(segments);
        Ok(url.to_string())
    }

    fn range(table: &str, cell: Option<&str>) -> String {
        let quoted = format!("'{}'", table.replace('\'', "''"));
        match cell {
            Some(c) => format!("{quoted}!{c}"),
            None => quoted,
        }
    }

    async fn metadata(&self) -> ClientResult<SpreadsheetMeta> {
        let url = self.url(&[&self.spreadsheet_id])?;
        self.http
            .send_json::<(), _>(
                Method::GET,
                &url,
                &[("fields", "sheets.properties(sheetId,title)")],
                None,
            )
            .await
    }

    async fn sheet_id(&self, table: &str) -> ClientResult<i64> {
        self.metadata()
            .await?
            .sheets
            .into_iter()
            .find(|s| s.properties.title == table)
            .map(|s| s.properties.sheet_id)
            .ok_or_else(|| ClientError::TableNotFound(table.to_string()))
    }

    async fn batch_update(&self, requests: Value) -> ClientResult<()> {
        let url = self.url(&[&format!("{}:batchUpdate", self.spreadsheet_id)])?;
        let body = json!({ "requests": requests });
        self.http
            .send_unit(Method::POST, &url, &[], Some(&body))
            .await
    }
}

fn cell_to_string(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        other => other.to_string(),
    }
}

impl TabularStore for SheetsClient {
    async fn ensure_table(&self, table: &str) -> ClientResult<bool> {
        let meta = self.metadata().await?;
        if meta.sheets.iter().any(|s| s.properties.title == table) {
            return Ok(false);
        }
        self.batch_update(json!([{ "addSheet": { "properties": { "title": table } } }]))
            .await?;
        info!(target: "store", table = %table, "worksheet created");
        Ok(true)
    }

    async fn read_all_rows(&self, table: &str) -> ClientResult<Vec<Vec<String>>> {
        let url = self.url(&[&self.spreadsheet_id, "values", &Self::range(table, None)])?;
        let range: ValueRange = self
            .http
            .send_json::<(), _>(Method::GET, &url, &[], None)
            .await?;
        let rows: Vec<Vec<String>> = range
            .values
            .iter()
            .map(|row| row.iter().map(cell_to_string).collect())
            .collect();
        debug!(target: "store", table = %table, rows = rows.len(), "rows fetched");
        Ok(rows)
    }

    async fn append_row(&self, table: &str, row: &[String]) -> ClientResult<()> {
        let range = Self::range(table, Some("A1"));
        let url = self.url(&[&self.spreadsheet_id, "values", &format!("{range}:append")])?;
        let rows = [row.to_vec()];
        let body = ValueRangeBody {
            range: &range,
            major_dimension: "ROWS",
            values: &rows,
        };
        self.http
            .send_unit(
                Method::POST,
                &url,
                &[
                    ("valueInputOption", "RAW"),
                    ("insertDataOption", "INSERT_ROWS"),
                ],
                Some(&body),
            )
            .await
    }

    async fn delete_row(&self, table: &str, row_number: usize) -> ClientResult<()> {
        if row_number == 0 {
            return Err(ClientError::Remote("row numbers start at 1".to_string()));
        }
        let sheet_id = self.sheet_id(table).await?;
        self.batch_update(json!([{
            "deleteDimension": {
                "range": {
                    "sheetId": sheet_id,
                    "dimension": "ROWS",
                    "startIndex": row_number - 1,
                    "endIndex": row_number,
                }
            }
        }]))
        .await
    }

    async fn read_cell(&self, table: &str, cell: &str) -> ClientResult<Option<String>> {
        let range = Self::range(table, Some(cell));
        let url = self.url(&[&self.spreadsheet_id, "values", &range])?;
        let vr: ValueRange = self
            .http
            .send_json::<(), _>(Method::GET, &url, &[], None)
            .await?;
        Ok(vr
            .values
            .first()
            .and_then(|row| row.first())
            .map(cell_to_string)
            .filter(|s| !s.is_empty()))
    }

    async fn write_range(
        &self,
        table: &str,
        start_cell: &str,
        rows: &[Vec<String>],
    ) -> ClientResult<()> {
        let range = Self::range(table, Some(start_cell));
        let url = self.url(&[&self.spreadsheet_id, "values", &range])?;
        let body = ValueRangeBody {
            range: &range,
            major_dimension: "ROWS",
            values: rows,
        };
        self.http
            .send_unit(Method::PUT, &url, &[("valueInputOption", "RAW")], Some(&body))
            .await
    }

    async fn clear(&self, table: &str) -> ClientResult<()> {
        let range = Self::range(table, None);
        let url = self.url(&[&self.spreadsheet_id, "values", &format!("{range}:clear")])?;
        self.http
            .send_unit(Method::POST, &url, &[], Some(&json!({})))
            .await
    }
}
