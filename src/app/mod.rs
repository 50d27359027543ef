//! Application service tying the trade store, attachment store and read cache together.
//!
//! Every mutation goes through here so the read cache is cleared afterwards,
//! and every read-modify-write of a shared document (identifier assignment,
//! settings, checklist schema) runs under one writer lock.

use std::time::Duration;

use chrono::NaiveDate;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::client::auth::GoogleAuth;
use crate::client::drive::DriveClient;
use crate::client::google::GoogleHttp;
use crate::client::sheets::SheetsClient;
use crate::client::ClientError;
use crate::journal::search::{self, SearchField};
use crate::journal::stats::DashboardStats;
use crate::journal::{
    ChecklistSchema, PickListError, SchemaError, Settings, TradeDraft, TradeRecord,
};
use crate::monitoring::metrics::METRICS;
use crate::storage::attachments::{Attachment, AttachmentStore};
use crate::storage::cache::ReadCache;
use crate::storage::journal_store::{JournalStore, TableNames};
use crate::storage::{FileStore, StoreError, TabularStore};
use crate::types::AppConfig;

pub mod view;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    PickList(#[from] PickListError),

    #[error("no trade with id or trade id {0}")]
    TradeNotFound(String),
}

pub type AppResult<T> = Result<T, AppError>;

/// Image supplied by the user, named as it was on their machine.
#[derive(Clone, Debug)]
pub struct ImageUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Clone, Debug)]
pub struct CreatedTrade {
    pub record: TradeRecord,
    pub attachments: Vec<Attachment>,
    /// Original names of images that could not be stored.
    pub failed_uploads: Vec<String>,
}

/// Everything a session needs on start. Falls back to empty state when the store is unreachable.
#[derive(Clone, Debug)]
pub struct JournalSnapshot {
    pub trades: Vec<TradeRecord>,
    pub settings: Settings,
    pub schema: ChecklistSchema,
    pub connection_ok: bool,
}

pub struct JournalApp<S, F> {
    store: JournalStore<S>,
    attachments: AttachmentStore<F>,
    cache: ReadCache<Vec<TradeRecord>>,
    writer: Mutex<()>,
}

impl JournalApp<SheetsClient, DriveClient> {
    /// Wire the Google Sheets and Drive clients from configuration.
    pub fn from_config(cfg: &AppConfig) -> AppResult<Self> {
        let auth = GoogleAuth::from_config(&cfg.google)?;
        let http = GoogleHttp::new(auth)?;
        let sheets = SheetsClient::new(http.clone(), &cfg.sheets);
        let drive = DriveClient::new(http, &cfg.drive);
        Ok(Self::new(
            JournalStore::new(sheets, TableNames::from(&cfg.sheets), &cfg.journal),
            AttachmentStore::new(drive),
            cfg.journal.cache_ttl(),
        ))
    }
}

impl<S: TabularStore, F: FileStore> JournalApp<S, F> {
    pub fn new(store: JournalStore<S>, attachments: AttachmentStore<F>, ttl: Duration) -> Self {
        Self {
            store,
            attachments,
            cache: ReadCache::new(ttl),
            writer: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &JournalStore<S> {
        &self.store
    }

    pub fn attachment_store(&self) -> &AttachmentStore<F> {
        &self.attachments
    }

    pub async fn init(&self) -> AppResult<()> {
        let _guard = self.writer.lock().await;
        self.store.ensure_layout().await?;
        self.cache.invalidate();
        Ok(())
    }

    /// Load trades, settings and schema together.
    pub async fn bootstrap(&self) -> JournalSnapshot {
        match futures::try_join!(self.trades(), self.settings(), self.schema()) {
            Ok((trades, settings, schema)) => JournalSnapshot {
                trades,
                settings,
                schema,
                connection_ok: true,
            },
            Err(e) => {
                error!(target: "journal", error = %e, "could not load journal from remote store");
                JournalSnapshot {
                    trades: Vec::new(),
                    settings: self.store.fallback_settings(),
                    schema: ChecklistSchema::default_schema(),
                    connection_ok: false,
                }
            }
        }
    }

    /// All trades in storage order, served from the read cache when fresh.
    pub async fn trades(&self) -> AppResult<Vec<TradeRecord>> {
        self.cache
            .get_or_load(|| async { self.store.load_trades().await.map_err(AppError::from) })
            .await
    }

    pub fn refresh(&self) {
        self.cache.invalidate();
    }

    pub async fn settings(&self) -> AppResult<Settings> {
        Ok(self.store.load_settings().await?)
    }

    pub async fn schema(&self) -> AppResult<ChecklistSchema> {
        Ok(self.store.load_schema().await?)
    }

    /// Look a trade up by surrogate id or by trade identifier.
    pub async fn find(&self, reference: &str) -> AppResult<TradeRecord> {
        let reference = reference.trim();
        self.trades()
            .await?
            .into_iter()
            .find(|r| r.id == reference || r.trade_id == reference)
            .ok_or_else(|| AppError::TradeNotFound(reference.to_string()))
    }

    /// Identifier the next saved trade would get; advisory only.
    pub async fn preview_trade_id(&self, asset: &str, date: NaiveDate) -> AppResult<String> {
        Ok(self.store.next_trade_id(asset, date).await?)
    }

    /// Save a new trade, then upload its images as attachments 1..n.
    ///
    /// The row is written first. Image failures are reported in
    /// `failed_uploads` and leave the saved row in place.
    pub async fn create_trade(
        &self,
        draft: TradeDraft,
        images: Vec<ImageUpload>,
    ) -> AppResult<CreatedTrade> {
        let record = {
            let _guard = self.writer.lock().await;
            let record = self.store.create(draft.into()).await?;
            self.cache.invalidate();
            record
        };
        METRICS.record_trade_created(&record.trade_id);

        let (attachments, failed_uploads) = self.upload_all(&record.trade_id, 1, images).await;
        Ok(CreatedTrade {
            record,
            attachments,
            failed_uploads,
        })
    }

    async fn upload_all(
        &self,
        trade_id: &str,
        first_sequence: u32,
        images: Vec<ImageUpload>,
    ) -> (Vec<Attachment>, Vec<String>) {
        let mut stored = Vec::new();
        let mut failed = Vec::new();
        let mut sequence = first_sequence;
        for image in images {
            match self
                .attachments
                .upload(trade_id, sequence, &image.file_name, image.bytes)
                .await
            {
                Some(a) => {
                    stored.push(a);
                    sequence += 1;
                }
                None => failed.push(image.file_name),
            }
        }
        if !failed.is_empty() {
            warn!(target: "journal", trade_id = %trade_id, failed = failed.len(), "some images were not stored");
        }
        (stored, failed)
    }

    /// Overwrite the stored row of `record.id`. Identifier columns are kept from storage.
    pub async fn update_trade(&self, record: &TradeRecord) -> AppResult<()> {
        let _guard = self.writer.lock().await;
        let found = self.store.update(record).await?;
        self.cache.invalidate();
        if !found {
            return Err(AppError::TradeNotFound(record.id.clone()));
        }
        METRICS.record_trade_updated(&record.trade_id);
        Ok(())
    }

    pub async fn set_reviewed(&self, id: &str, reviewed: bool) -> AppResult<()> {
        let found = {
            let _guard = self.writer.lock().await;
            let found = self.store.set_reviewed(id, reviewed).await?;
            self.cache.invalidate();
            found
        };
        if !found {
            return Err(AppError::TradeNotFound(id.to_string()));
        }
        info!(target: "journal", id = %id, reviewed, "review flag set");
        Ok(())
    }

    /// Flip the review flag of a trade and return the new value.
    pub async fn toggle_reviewed(&self, reference: &str) -> AppResult<bool> {
        let record = self.find(reference).await?;
        let flag = !record.reviewed;
        self.set_reviewed(&record.id, flag).await?;
        Ok(flag)
    }

    /// Remove the trade row. Attachments stay in the file store.
    pub async fn delete_trade(&self, id: &str) -> AppResult<()> {
        let removed = {
            let _guard = self.writer.lock().await;
            let removed = self.store.delete(id).await?;
            self.cache.invalidate();
            removed
        };
        if !removed {
            return Err(AppError::TradeNotFound(id.to_string()));
        }
        METRICS.record_trade_deleted(id);
        Ok(())
    }

    pub async fn attachments(&self, trade_id: &str) -> Vec<Attachment> {
        self.attachments.list(trade_id).await
    }

    /// Append images to an existing trade, continuing its sequence numbers.
    pub async fn attach(
        &self,
        reference: &str,
        images: Vec<ImageUpload>,
    ) -> AppResult<(Vec<Attachment>, Vec<String>)> {
        let record = self.find(reference).await?;
        let _guard = self.writer.lock().await;
        let next = self.attachments.next_sequence(&record.trade_id).await;
        Ok(self.upload_all(&record.trade_id, next, images).await)
    }

    pub async fn detach(&self, file_id: &str) -> bool {
        self.attachments.delete(file_id).await
    }

    /// Apply `change` to the stored schema and persist it when it succeeds.
    pub async fn update_schema<R>(
        &self,
        change: impl FnOnce(&mut ChecklistSchema) -> Result<R, SchemaError>,
    ) -> AppResult<R> {
        let _guard = self.writer.lock().await;
        let mut schema = self.store.load_schema().await?;
        let out = change(&mut schema)?;
        self.store.save_schema(&schema).await?;
        Ok(out)
    }

    pub async fn update_settings<R>(
        &self,
        change: impl FnOnce(&mut Settings) -> Result<R, PickListError>,
    ) -> AppResult<R> {
        let _guard = self.writer.lock().await;
        let mut settings = self.store.load_settings().await?;
        let out = change(&mut settings)?;
        self.store.save_settings(&settings).await?;
        Ok(out)
    }

    pub async fn dashboard(&self) -> AppResult<DashboardStats> {
        Ok(DashboardStats::compute(&self.trades().await?))
    }

    /// Trades matching `query` in `field`, newest first.
    pub async fn search(&self, query: &str, field: SearchField) -> AppResult<Vec<TradeRecord>> {
        let mut trades: Vec<TradeRecord> = self
            .trades()
            .await?
            .into_iter()
            .filter(|r| search::matches(r, query, field))
            .collect();
        search::sort_newest_first(&mut trades);
        Ok(trades)
    }
}
