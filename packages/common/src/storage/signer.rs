use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::key::StorageKey;

type HmacSha256 = Hmac<Sha256>;

/// Why a signed URL was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureError {
    Expired,
    Invalid,
}

impl fmt::Display for SignatureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expired => f.write_str("signed URL has expired"),
            Self::Invalid => f.write_str("signed URL signature is invalid"),
        }
    }
}

impl std::error::Error for SignatureError {}

/// Issues and verifies time-limited read URLs for stores that cannot presign
/// on their own.
///
/// URL shape: `{base_url}/files/{key}?expires={unix_seconds}&signature={hex}`,
/// where the signature is HMAC-SHA256 over `"{key}\n{expires}"`.
#[derive(Clone)]
pub struct UrlSigner {
    secret: Vec<u8>,
    base_url: String,
}

impl UrlSigner {
    pub fn new(secret: impl AsRef<[u8]>, base_url: &str) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// A signer with a random secret. URLs it issues stop verifying once the
    /// process restarts.
    pub fn ephemeral(base_url: &str) -> Self {
        let secret: [u8; 32] = rand::random();
        Self::new(secret, base_url)
    }

    pub fn sign(&self, key: &StorageKey, ttl: Duration) -> String {
        self.sign_at(key, ttl, Utc::now())
    }

    pub fn sign_at(&self, key: &StorageKey, ttl: Duration, now: DateTime<Utc>) -> String {
        let ttl = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        let expires = now.timestamp().saturating_add(ttl);
        let signature = hex::encode(self.mac(key.as_str(), expires).finalize().into_bytes());
        format!(
            "{}/files/{}?expires={expires}&signature={signature}",
            self.base_url, key
        )
    }

    pub fn verify(&self, key: &str, expires: i64, signature: &str) -> Result<(), SignatureError> {
        self.verify_at(key, expires, signature, Utc::now())
    }

    pub fn verify_at(
        &self,
        key: &str,
        expires: i64,
        signature: &str,
        now: DateTime<Utc>,
    ) -> Result<(), SignatureError> {
        let provided = hex::decode(signature).map_err(|_| SignatureError::Invalid)?;
        self.mac(key, expires)
            .verify_slice(&provided)
            .map_err(|_| SignatureError::Invalid)?;
        if now.timestamp() > expires {
            return Err(SignatureError::Expired);
        }
        Ok(())
    }

    fn mac(&self, key: &str, expires: i64) -> HmacSha256 {
        let mut mac = <HmacSha256 as Mac>::new_from_slice(&self.secret)
            .expect("HMAC can take key of any size");
        mac.update(key.as_bytes());
        mac.update(b"\n");
        mac.update(expires.to_string().as_bytes());
        mac
    }
}

impl fmt::Debug for UrlSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UrlSigner")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}
