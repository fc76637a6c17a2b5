use std::time::Duration;

use async_trait::async_trait;

use super::error::StorageError;
use super::key::StorageKey;

/// Key-addressed binary object storage.
///
/// Implementations perform no retries; a failure is surfaced once and the
/// caller owns retry policy.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `data` under `key`, replacing any previous object, and return the key.
    async fn put(
        &self,
        key: &StorageKey,
        data: &[u8],
        content_type: &str,
    ) -> Result<StorageKey, StorageError>;

    /// Retrieve all bytes stored under `key`.
    async fn get(&self, key: &StorageKey) -> Result<Vec<u8>, StorageError>;

    /// Check whether an object exists.
    async fn exists(&self, key: &StorageKey) -> Result<bool, StorageError>;

    /// Delete the object under `key`.
    ///
    /// Returns `true` if an object was removed, `false` if none existed.
    /// Deleting an absent key is not an error.
    async fn delete(&self, key: &StorageKey) -> Result<bool, StorageError>;

    /// Get the size of an object in bytes.
    async fn size(&self, key: &StorageKey) -> Result<u64, StorageError>;

    /// A URL granting read access to `key` for `ttl`.
    async fn signed_read_url(
        &self,
        key: &StorageKey,
        ttl: Duration,
    ) -> Result<String, StorageError>;
}
