use std::sync::Arc;

use common::StorageBackendKind;
use common::storage::filesystem::FilesystemBlobStore;
use common::storage::s3::S3BlobStore;
use common::storage::{BlobStore, StorageError, UrlSigner};
use sea_orm::DatabaseConnection;
use tracing::{info, warn};

use crate::catalog::DbAssetCatalog;
use crate::config::{AppConfig, StorageConfig};
use crate::ledger::DbQuotaLedger;
use crate::pipeline::{AssetPipeline, PipelineSettings};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub pipeline: AssetPipeline,
    pub blob_store: Arc<dyn BlobStore>,
    /// Set when the blob store cannot presign by itself; `/files` then serves
    /// URLs signed with it.
    pub url_signer: Option<UrlSigner>,
}

impl AppState {
    /// Wire the configured blob store, catalog and ledger into a pipeline.
    pub async fn from_config(
        config: AppConfig,
        db: DatabaseConnection,
    ) -> Result<Self, StorageError> {
        let (blob_store, url_signer) = open_blob_store(&config.storage).await?;

        let pipeline = AssetPipeline::new(
            blob_store.clone(),
            Arc::new(DbAssetCatalog::new(db.clone())),
            Arc::new(DbQuotaLedger::new(db)),
            PipelineSettings {
                blob_timeout: config.storage.request_timeout(),
                signed_url_ttl: config.storage.signed_url_ttl(),
            },
        );

        Ok(Self {
            config: Arc::new(config),
            pipeline,
            blob_store,
            url_signer,
        })
    }
}

async fn open_blob_store(
    storage: &StorageConfig,
) -> Result<(Arc<dyn BlobStore>, Option<UrlSigner>), StorageError> {
    match storage.backend {
        StorageBackendKind::Filesystem => {
            let signer = match &storage.signing_secret {
                Some(secret) => UrlSigner::new(secret, &storage.public_base_url),
                None => {
                    warn!(
                        "storage.signing_secret is not set; signed URLs will stop working after a restart"
                    );
                    UrlSigner::ephemeral(&storage.public_base_url)
                }
            };
            let store = FilesystemBlobStore::new(
                storage.root.clone(),
                storage.max_object_size,
                signer.clone(),
            )
            .await?;
            info!(root = %storage.root.display(), "using filesystem blob store");
            Ok((Arc::new(store), Some(signer)))
        }
        StorageBackendKind::S3 => {
            let s3 = storage.s3.as_ref().ok_or_else(|| {
                StorageError::Transport("storage.backend is s3 but storage.s3 is missing".into())
            })?;
            let store = S3BlobStore::new(s3, storage.max_object_size)?;
            info!(bucket = %s3.bucket, "using S3 blob store");
            Ok((Arc::new(store), None))
        }
    }
}
