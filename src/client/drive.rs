//! Google Drive v3 client for screenshot storage.

use reqwest::Method;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::storage::{FileStore, RemoteFile};
use crate::types::DriveConfig;

use super::google::{join_url, GoogleHttp};
use super::ClientResult;

const BOUNDARY: &str = "trade_journal_upload_boundary";

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<RemoteFile>,
}

pub struct DriveClient {
    http: GoogleHttp,
    base_url: String,
    upload_url: String,
    folder_id: String,
}

impl DriveClient {
    pub fn new(http: GoogleHttp, cfg: &DriveConfig) -> Self {
        Self {
            http,
            base_url: cfg.base_url.clone(),
            upload_url: cfg.upload_url.clone(),
            folder_id: cfg.images_folder_id.clone(),
        }
    }
}

/// Escape a literal for use inside a single-quoted Drive query string.
fn escape_query_literal(s: &str) -> String {
    s.replace('\\', "\\\\").replace('\'', "\\'")
}

fn multipart_related_body(metadata: &serde_json::Value, mime_type: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(bytes.len() + 512);
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(b"Content-Type: application/json; charset=UTF-8\r\n\r\n");
    body.extend_from_slice(metadata.to_string().as_bytes());
    body.extend_from_slice(format!("\r\n--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(format!("Content-Type: {mime_type}\r\n\r\n").as_bytes());
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--").as_bytes());
    body
}

impl FileStore for DriveClient {
    async fn create_file(
        &self,
        name: &str,
        mime_type: &str,
        bytes: Vec<u8>,
    ) -> ClientResult<RemoteFile> {
        let metadata = json!({ "name": name, "parents": [self.folder_id] });
        let body = multipart_related_body(&metadata, mime_type, &bytes);
        let url = join_url(&self.upload_url, "drive/v3/files");
        let file: RemoteFile = self
            .http
            .send_bytes(
                &url,
                &[("uploadType", "multipart"), ("fields", "id,name")],
                &format!("multipart/related; boundary={BOUNDARY}"),
                body,
            )
            .await?;
        debug!(target: "drive", file_id = %file.id, name = %file.name, "file uploaded");
        Ok(file)
    }

    async fn make_public(&self, file_id: &str) -> ClientResult<()> {
        let url = join_url(&self.base_url, &format!("drive/v3/files/{file_id}/permissions"));
        let body = json!({ "type": "anyone", "role": "reader" });
        self.http
            .send_unit(Method::POST, &url, &[], Some(&body))
            .await
    }

    async fn list_by_name(&self, needle: &str) -> ClientResult<Vec<RemoteFile>> {
        let q = format!(
            "'{}' in parents and name contains '{}' and trashed=false",
            escape_query_literal(&self.folder_id),
            escape_query_literal(needle)
        );
        let url = join_url(&self.base_url, "drive/v3/files");
        let list: FileList = self
            .http
            .send_json::<(), _>(
                Method::GET,
                &url,
                &[("q", q.as_str()), ("fields", "files(id,name)")],
                None,
            )
            .await?;
        Ok(list.files)
    }

    async fn delete_file(&self, file_id: &str) -> ClientResult<()> {
        let url = join_url(&self.base_url, &format!("drive/v3/files/{file_id}"));
        self.http
            .send_unit::<()>(Method::DELETE, &url, &[], None)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_literals_are_escaped() {
        assert_eq!(escape_query_literal("a'b"), "a\\'b");
        assert_eq!(escape_query_literal("a\\b"), "a\\\\b");
        assert_eq!(escape_query_literal("00001NQ04012026"), "00001NQ04012026");
    }

    #[test]
    fn multipart_body_has_both_parts() {
        let body = multipart_related_body(&json!({"name": "x.png"}), "image/png", b"PNG");
        let text = String::from_utf8(body).unwrap();
        assert!(text.starts_with(&format!("--{BOUNDARY}\r\n")));
        assert!(text.contains(r#"{"name":"x.png"}"#));
        assert!(text.contains("Content-Type: image/png\r\n\r\nPNG"));
        assert!(text.ends_with(&format!("--{BOUNDARY}--")));
    }
}
