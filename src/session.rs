use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::types::AuthConfig;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no shared secret configured (auth.app_password or auth.app_password_sha256)")]
    NotConfigured,

    #[error("auth.app_password_sha256 is not a 32 byte hex digest: {0}")]
    BadDigest(String),

    #[error("hmac error: {0}")]
    Hmac(String),
}

/// Single shared-secret gate in front of every command.
///
/// The secret is held only as a SHA-256 digest. Candidates are hashed and
/// compared through an HMAC keyed per session so the comparison runs in
/// constant time.
pub struct SessionGate {
    key: [u8; 16],
    expected_tag: Vec<u8>,
    authenticated: bool,
}

impl SessionGate {
    pub fn from_config(cfg: &AuthConfig) -> Result<Self, SessionError> {
        let digest: Vec<u8> = match (&cfg.app_password_sha256, &cfg.app_password) {
            (Some(hex_digest), _) if !hex_digest.trim().is_empty() => {
                let bytes = hex::decode(hex_digest.trim())
                    .map_err(|e| SessionError::BadDigest(e.to_string()))?;
                if bytes.len() != 32 {
                    return Err(SessionError::BadDigest(format!("{} bytes", bytes.len())));
                }
                bytes
            }
            (_, Some(password)) if !password.is_empty() => {
                Sha256::digest(password.as_bytes()).to_vec()
            }
            _ => return Err(SessionError::NotConfigured),
        };
        Self::from_digest(&digest)
    }

    pub fn from_digest(digest: &[u8]) -> Result<Self, SessionError> {
        let key = *Uuid::new_v4().as_bytes();
        let expected_tag = Self::tag(&key, digest)?;
        Ok(Self {
            key,
            expected_tag,
            authenticated: false,
        })
    }

    fn mac(key: &[u8], digest: &[u8]) -> Result<HmacSha256, SessionError> {
        let mut mac =
            HmacSha256::new_from_slice(key).map_err(|e| SessionError::Hmac(e.to_string()))?;
        mac.update(digest);
        Ok(mac)
    }

    fn tag(key: &[u8], digest: &[u8]) -> Result<Vec<u8>, SessionError> {
        Ok(Self::mac(key, digest)?.finalize().into_bytes().to_vec())
    }

    /// Check `candidate`; a match marks the session authenticated for its lifetime.
    pub fn attempt(&mut self, candidate: &str) -> bool {
        if self.authenticated {
            return true;
        }
        let digest = Sha256::digest(candidate.as_bytes());
        let ok = Self::mac(&self.key, &digest)
            .map(|mac| mac.verify_slice(&self.expected_tag).is_ok())
            .unwrap_or(false);
        if ok {
            self.authenticated = true;
            info!(target: "journal", "session unlocked");
        } else {
            warn!(target: "journal", "wrong password");
        }
        ok
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }
}
