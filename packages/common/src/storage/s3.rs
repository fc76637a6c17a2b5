use std::time::Duration;

use async_trait::async_trait;
use s3::creds::Credentials;
use s3::error::S3Error;
use s3::{Bucket, Region};

use super::error::StorageError;
use super::key::StorageKey;
use super::traits::BlobStore;
use crate::config::S3Config;

/// Presigned URLs are capped at one week by S3.
const MAX_PRESIGN_SECS: u64 = 7 * 24 * 3600;

/// S3-compatible object storage backend.
pub struct S3BlobStore {
    bucket: Box<Bucket>,
    max_size: u64,
}

impl S3BlobStore {
    pub fn new(config: &S3Config, max_size: u64) -> Result<Self, StorageError> {
        let region = match &config.endpoint {
            Some(endpoint) => Region::Custom {
                region: config.region.clone(),
                endpoint: endpoint.clone(),
            },
            None => config
                .region
                .parse()
                .map_err(|e| StorageError::Transport(format!("invalid region: {e}")))?,
        };
        let credentials = Credentials::new(
            Some(&config.access_key),
            Some(&config.secret_key),
            None,
            None,
            None,
        )
        .map_err(|e| StorageError::Transport(format!("invalid credentials: {e}")))?;

        let mut bucket = Bucket::new(&config.bucket, region, credentials).map_err(transport)?;
        if config.path_style {
            bucket = bucket.with_path_style();
        }
        Ok(Self { bucket, max_size })
    }
}

fn transport(err: S3Error) -> StorageError {
    StorageError::Transport(err.to_string())
}

fn status_error(key: &StorageKey, status: u16) -> StorageError {
    match status {
        404 => StorageError::NotFound(key.to_string()),
        other => StorageError::Transport(format!("unexpected status {other} for {key}")),
    }
}

/// Map a client error, treating an HTTP 404 as a missing object.
fn request_error(key: &StorageKey, err: S3Error) -> StorageError {
    match err {
        S3Error::HttpFailWithBody(status, _) => status_error(key, status),
        other => transport(other),
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn put(
        &self,
        key: &StorageKey,
        data: &[u8],
        content_type: &str,
    ) -> Result<StorageKey, StorageError> {
        if data.len() as u64 > self.max_size {
            return Err(StorageError::SizeLimitExceeded {
                actual: data.len() as u64,
                limit: self.max_size,
            });
        }
        let response = self
            .bucket
            .put_object_with_content_type(key.as_str(), data, content_type)
            .await
            .map_err(|e| request_error(key, e))?;
        match response.status_code() {
            200..=299 => Ok(key.clone()),
            status => Err(StorageError::Transport(format!(
                "put {key} failed with status {status}"
            ))),
        }
    }

    async fn get(&self, key: &StorageKey) -> Result<Vec<u8>, StorageError> {
        let response = self
            .bucket
            .get_object(key.as_str())
            .await
            .map_err(|e| request_error(key, e))?;
        match response.status_code() {
            200..=299 => Ok(response.bytes().to_vec()),
            status => Err(status_error(key, status)),
        }
    }

    async fn exists(&self, key: &StorageKey) -> Result<bool, StorageError> {
        match self.size(key).await {
            Ok(_) => Ok(true),
            Err(StorageError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn delete(&self, key: &StorageKey) -> Result<bool, StorageError> {
        // S3 answers 204 whether or not the object existed.
        let existed = self.exists(key).await?;
        if !existed {
            return Ok(false);
        }
        let response = self
            .bucket
            .delete_object(key.as_str())
            .await
            .map_err(|e| request_error(key, e))?;
        match response.status_code() {
            200..=299 | 404 => Ok(true),
            status => Err(StorageError::Transport(format!(
                "delete {key} failed with status {status}"
            ))),
        }
    }

    async fn size(&self, key: &StorageKey) -> Result<u64, StorageError> {
        let (head, status) = self
            .bucket
            .head_object(key.as_str())
            .await
            .map_err(|e| request_error(key, e))?;
        match status {
            200..=299 => Ok(head.content_length.unwrap_or(0).max(0) as u64),
            status => Err(status_error(key, status)),
        }
    }

    async fn signed_read_url(
        &self,
        key: &StorageKey,
        ttl: Duration,
    ) -> Result<String, StorageError> {
        let secs = ttl.as_secs().clamp(1, MAX_PRESIGN_SECS) as u32;
        self.bucket
            .presign_get(key.as_str(), secs, None)
            .await
            .map_err(transport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> S3Config {
        S3Config {
            bucket: "images".into(),
            region: "us-east-1".into(),
            endpoint: Some("http://127.0.0.1:9000".into()),
            access_key: "minio".into(),
            secret_key: "minio-secret".into(),
            path_style: true,
        }
    }

    #[test]
    fn builds_against_custom_endpoint() {
        assert!(S3BlobStore::new(&config(), 1024).is_ok());
    }

    #[tokio::test]
    async fn oversized_put_is_rejected_before_any_request() {
        let store = S3BlobStore::new(&config(), 4).unwrap();
        let key = StorageKey::parse("images/u1/a.png").unwrap();
        let result = store.put(&key, b"too large", "image/png").await;
        assert!(matches!(
            result,
            Err(StorageError::SizeLimitExceeded { actual: 9, limit: 4 })
        ));
    }

    #[tokio::test]
    async fn presigned_url_targets_key() {
        let store = S3BlobStore::new(&config(), 1024).unwrap();
        let key = StorageKey::parse("images/u1/a.png").unwrap();
        let url = store
            .signed_read_url(&key, Duration::from_secs(3600))
            .await
            .unwrap();
        assert!(url.contains("/images/u1/a.png?"));
        assert!(url.contains("X-Amz-Expires=3600"));
    }

    #[test]
    fn status_404_is_not_found() {
        let key = StorageKey::parse("k.png").unwrap();
        assert!(matches!(status_error(&key, 404), StorageError::NotFound(_)));
        assert!(status_error(&key, 503).is_transport());
    }
}
