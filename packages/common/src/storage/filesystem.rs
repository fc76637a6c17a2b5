use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tokio::fs;

use super::error::StorageError;
use super::key::StorageKey;
use super::signer::UrlSigner;
use super::traits::BlobStore;

/// Filesystem-backed blob store.
///
/// An object lives at `{base_path}/{key}`. Writes land in
/// `{base_path}/.tmp` first and are renamed into place, so a reader never
/// observes a half-written object.
pub struct FilesystemBlobStore {
    base_path: PathBuf,
    max_size: u64,
    signer: UrlSigner,
}

impl FilesystemBlobStore {
    /// Create a new filesystem blob store.
    pub async fn new(
        base_path: PathBuf,
        max_size: u64,
        signer: UrlSigner,
    ) -> Result<Self, StorageError> {
        fs::create_dir_all(&base_path).await?;
        fs::create_dir_all(base_path.join(".tmp")).await?;
        Ok(Self {
            base_path,
            max_size,
            signer,
        })
    }

    fn object_path(&self, key: &StorageKey) -> PathBuf {
        let mut path = self.base_path.clone();
        for segment in key.segments() {
            path.push(segment);
        }
        path
    }

    fn temp_path(&self) -> PathBuf {
        self.base_path
            .join(".tmp")
            .join(uuid::Uuid::new_v4().to_string())
    }
}

/// Write `data` to `temp_path`, sync it and rename it onto `object_path`.
/// The temp file is removed on any failure.
fn write_atomically(temp_path: &Path, object_path: &Path, data: &[u8]) -> std::io::Result<()> {
    let result = (|| {
        let mut file = std::fs::File::create(temp_path)?;
        file.write_all(data)?;
        file.sync_all()?;
        if let Some(parent) = object_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::rename(temp_path, object_path)
    })();
    if result.is_err() {
        let _ = std::fs::remove_file(temp_path);
    }
    result
}

#[async_trait]
impl BlobStore for FilesystemBlobStore {
    async fn put(
        &self,
        key: &StorageKey,
        data: &[u8],
        _content_type: &str,
    ) -> Result<StorageKey, StorageError> {
        if data.len() as u64 > self.max_size {
            return Err(StorageError::SizeLimitExceeded {
                actual: data.len() as u64,
                limit: self.max_size,
            });
        }

        let object_path = self.object_path(key);
        let temp_path = self.temp_path();
        let data_owned = data.to_vec();

        // The write runs on the blocking pool; dropping this future (for
        // example on a timeout) does not abandon a half-written temp file.
        tokio::task::spawn_blocking(move || write_atomically(&temp_path, &object_path, &data_owned))
            .await
            .map_err(|e| StorageError::Io(std::io::Error::other(e)))??;

        tracing::debug!(key = %key, size = data.len(), "stored object");
        Ok(key.clone())
    }

    async fn get(&self, key: &StorageKey) -> Result<Vec<u8>, StorageError> {
        match fs::read(self.object_path(key)).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, key: &StorageKey) -> Result<bool, StorageError> {
        Ok(fs::try_exists(self.object_path(key)).await?)
    }

    async fn delete(&self, key: &StorageKey) -> Result<bool, StorageError> {
        match fs::remove_file(self.object_path(key)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn size(&self, key: &StorageKey) -> Result<u64, StorageError> {
        match fs::metadata(self.object_path(key)).await {
            Ok(meta) => Ok(meta.len()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn signed_read_url(
        &self,
        key: &StorageKey,
        ttl: Duration,
    ) -> Result<String, StorageError> {
        Ok(self.signer.sign(key, ttl))
    }
}
