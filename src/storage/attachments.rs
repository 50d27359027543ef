//! Screenshot files kept in a [`FileStore`], tied to a trade by file name only.

use std::path::Path;

use serde::Serialize;
use tracing::{info, warn};

use crate::monitoring::metrics::METRICS;

use super::FileStore;

pub const ALLOWED_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "gif"];

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Attachment {
    pub id: String,
    pub name: String,
    pub url: String,
    pub sequence: u32,
}

/// Lowercased extension of `file_name` when it is an accepted image type.
pub fn image_extension(file_name: &str) -> Option<String> {
    let ext = Path::new(file_name).extension()?.to_str()?.to_ascii_lowercase();
    ALLOWED_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

pub fn mime_for_extension(ext: &str) -> &'static str {
    match ext {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        _ => "application/octet-stream",
    }
}

/// `{trade_id}_{NN}.{ext}` with a zero-padded two digit sequence.
pub fn attachment_name(trade_id: &str, sequence: u32, ext: &str) -> String {
    format!("{trade_id}_{sequence:02}.{}", ext.to_ascii_lowercase())
}

/// Sequence number of `name` when it is exactly an attachment of `trade_id`.
pub fn parse_attachment_name(trade_id: &str, name: &str) -> Option<u32> {
    let rest = name.strip_prefix(trade_id)?.strip_prefix('_')?;
    let (seq, ext) = rest.split_once('.')?;
    if seq.len() < 2 || !seq.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if !ALLOWED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()) {
        return None;
    }
    seq.parse().ok()
}

pub struct AttachmentStore<F> {
    files: F,
}

impl<F: FileStore> AttachmentStore<F> {
    pub fn new(files: F) -> Self {
        Self { files }
    }

    pub fn inner(&self) -> &F {
        &self.files
    }

    /// Upload `bytes` as attachment `sequence` of `trade_id` and make it public.
    ///
    /// The extension is taken from `original_name`. Returns `None` with a
    /// warning when the type is not accepted or the remote store fails. A file
    /// that was created but could not be shared is removed again.
    pub async fn upload(
        &self,
        trade_id: &str,
        sequence: u32,
        original_name: &str,
        bytes: Vec<u8>,
    ) -> Option<Attachment> {
        let Some(ext) = image_extension(original_name) else {
            warn!(target: "drive", file = %original_name, "unsupported attachment type");
            METRICS.record_upload(original_name, false);
            return None;
        };
        let name = attachment_name(trade_id, sequence, &ext);

        let file = match self
            .files
            .create_file(&name, mime_for_extension(&ext), bytes)
            .await
        {
            Ok(file) => file,
            Err(e) => {
                warn!(target: "drive", name = %name, error = %e, "attachment upload failed");
                METRICS.record_upload(&name, false);
                return None;
            }
        };
        if let Err(e) = self.files.make_public(&file.id).await {
            warn!(target: "drive", file_id = %file.id, error = %e, "could not share attachment");
            // An unshared leftover would hold this sequence number.
            if let Err(e) = self.files.delete_file(&file.id).await {
                warn!(target: "drive", file_id = %file.id, error = %e, "could not remove unshared attachment");
            }
            METRICS.record_upload(&name, false);
            return None;
        }

        METRICS.record_upload(&name, true);
        info!(target: "drive", file_id = %file.id, name = %name, "attachment stored");
        Some(Attachment {
            url: self.files.view_url(&file.id),
            id: file.id,
            name: file.name,
            sequence,
        })
    }

    /// Attachments of `trade_id` ordered by sequence. Empty on remote failure.
    pub async fn list(&self, trade_id: &str) -> Vec<Attachment> {
        if trade_id.is_empty() {
            return Vec::new();
        }
        let files = match self.files.list_by_name(trade_id).await {
            Ok(files) => files,
            Err(e) => {
                warn!(target: "drive", trade_id = %trade_id, error = %e, "attachment listing failed");
                return Vec::new();
            }
        };
        let mut found: Vec<Attachment> = files
            .into_iter()
            .filter_map(|f| {
                let sequence = parse_attachment_name(trade_id, &f.name)?;
                Some(Attachment {
                    url: self.files.view_url(&f.id),
                    id: f.id,
                    name: f.name,
                    sequence,
                })
            })
            .collect();
        found.sort_by(|a, b| a.sequence.cmp(&b.sequence).then_with(|| a.name.cmp(&b.name)));
        found
    }

    /// Sequence for the next upload: one past the highest existing, or 1.
    pub async fn next_sequence(&self, trade_id: &str) -> u32 {
        self.list(trade_id)
            .await
            .iter()
            .map(|a| a.sequence)
            .max()
            .map_or(1, |m| m + 1)
    }

    pub async fn delete(&self, file_id: &str) -> bool {
        match self.files.delete_file(file_id).await {
            Ok(()) => {
                info!(target: "drive", file_id = %file_id, "attachment deleted");
                true
            }
            Err(e) => {
                warn!(target: "drive", file_id = %file_id, error = %e, "attachment delete failed");
                false
            }
        }
    }
}
