use std::time::{Duration, Instant};

use reqwest::Client;
use serde::Deserialize;
use serde_with::{serde_as, DurationSeconds};
use tokio::sync::Mutex;
use tracing::debug;

use crate::types::GoogleConfig;

use super::{ClientError, ClientResult};

/// Refresh this long before the reported expiry.
const EXPIRY_SLACK: Duration = Duration::from_secs(60);

#[serde_as]
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde_as(as = "DurationSeconds<u64>")]
    expires_in: Duration,
}

#[derive(Debug)]
struct CachedToken {
    token: String,
    expires_at: Instant,
}

#[derive(Debug)]
enum TokenSource {
    Static(String),
    Refresh {
        token_url: String,
        client_id: String,
        client_secret: String,
        refresh_token: String,
        cached: Mutex<Option<CachedToken>>,
    },
}

/// Bearer token provider shared by the Sheets and Drive clients.
#[derive(Debug)]
pub struct GoogleAuth {
    source: TokenSource,
}

impl GoogleAuth {
    pub fn from_config(cfg: &GoogleConfig) -> ClientResult<Self> {
        if let Some(token) = cfg.access_token.as_ref().filter(|t| !t.is_empty()) {
            return Ok(Self {
                source: TokenSource::Static(token.clone()),
            });
        }

        match (&cfg.client_id, &cfg.client_secret, &cfg.refresh_token) {
            (Some(client_id), Some(client_secret), Some(refresh_token)) => Ok(Self {
                source: TokenSource::Refresh {
                    token_url: cfg.token_url.clone(),
                    client_id: client_id.clone(),
                    client_secret: client_secret.clone(),
                    refresh_token: refresh_token.clone(),
                    cached: Mutex::new(None),
                },
            }),
            _ => Err(ClientError::Config(
                "either google.access_token or client_id/client_secret/refresh_token must be configured"
                    .to_string(),
            )),
        }
    }

    /// Return a valid access token, exchanging the refresh token when the cached one is stale.
    pub async fn bearer(&self, http: &Client) -> ClientResult<String> {
        match &self.source {
            TokenSource::Static(token) => Ok(token.clone()),
            TokenSource::Refresh {
                token_url,
                client_id,
                client_secret,
                refresh_token,
                cached,
            } => {
                let mut guard = cached.lock().await;
                if let Some(tok) = guard.as_ref() {
                    if Instant::now() < tok.expires_at {
                        return Ok(tok.token.clone());
                    }
                }

                let resp = http
                    .post(token_url)
                    .form(&[
                        ("client_id", client_id.as_str()),
                        ("client_secret", client_secret.as_str()),
                        ("refresh_token", refresh_token.as_str()),
                        ("grant_type", "refresh_token"),
                    ])
                    .send()
                    .await?;

                if !resp.status().is_success() {
                    let status = resp.status();
                    let body = resp.text().await.unwrap_or_default();
                    return Err(ClientError::Token(format!(
                        "token exchange failed with {status}: {body}"
                    )));
                }

                let parsed: TokenResponse = resp.json().await?;
                let lifetime = parsed.expires_in.saturating_sub(EXPIRY_SLACK);
                debug!(target: "journal", lifetime_secs = lifetime.as_secs(), "access token refreshed");
                *guard = Some(CachedToken {
                    token: parsed.access_token.clone(),
                    expires_at: Instant::now() + lifetime,
                });
                Ok(parsed.access_token)
            }
        }
    }
}
