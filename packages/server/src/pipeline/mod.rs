//! Asset pipeline: keeps blob storage, the catalog and the quota ledger in
//! step for every asset operation.
//!
//! Mutations always run codec work first, then blob store, then catalog,
//! then ledger. There is no cross-store transaction; each step's failure
//! mode is handled as follows.
//!
//! * blob write fails: nothing was persisted, the error is returned.
//! * catalog insert fails after the blob write: the blob is orphaned and
//!   logged, the error is returned. The blob is not deleted.
//! * ledger adjust fails: the operation still succeeds and the drift is logged.
//! * blob delete fails: the catalog is left untouched.
//! * catalog delete fails after the blob delete: the error is returned and
//!   later reads of the record report a storage inconsistency.
//!
//! A read that finds the blob gone while a delete of the same asset is still
//! running reports `NotFound`: the delete has won.

mod error;

pub use error::PipelineError;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use common::storage::{BlobStore, ContentHash, StorageError, StorageKey};
use dashmap::DashSet;
use imaging::{OutputFormat, TransformRequest};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::catalog::{AssetCatalog, NewAsset, PageRequest};
use crate::entity::image_asset;
use crate::ledger::QuotaLedger;
use crate::models::image::{AssetDetails, AssetPage, AssetSummary, StorageUsage};
use crate::models::shared::Pagination;

#[derive(Debug, Clone, Copy)]
pub struct PipelineSettings {
    /// Upper bound on each blob store call.
    pub blob_timeout: Duration,
    /// Lifetime of URLs returned by [`AssetPipeline::details`].
    pub signed_url_ttl: Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            blob_timeout: Duration::from_secs(30),
            signed_url_ttl: Duration::from_secs(3600),
        }
    }
}

/// An uploaded file, already authenticated and size-checked by the caller.
#[derive(Debug)]
pub struct UploadInput {
    pub bytes: Vec<u8>,
    pub original_name: String,
    /// Declared MIME type.
    pub mime_type: String,
}

/// Raw bytes of a stored image with the metadata needed to serve them.
#[derive(Debug)]
pub struct AssetBytes {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub original_name: String,
    pub content_hash: String,
}

/// Encoded bytes about to become a new asset.
struct Staged {
    id: Uuid,
    owner_id: String,
    key: StorageKey,
    original_name: String,
    mime_type: String,
    bytes: Vec<u8>,
    width: u32,
    height: u32,
}

#[derive(Clone)]
pub struct AssetPipeline {
    blobs: Arc<dyn BlobStore>,
    catalog: Arc<dyn AssetCatalog>,
    ledger: Arc<dyn QuotaLedger>,
    settings: PipelineSettings,
    /// Assets whose delete has started and not yet finished.
    deleting: Arc<DashSet<Uuid>>,
}

/// Marks an asset as being deleted until dropped.
struct DeleteInFlight {
    deleting: Arc<DashSet<Uuid>>,
    id: Uuid,
}

impl Drop for DeleteInFlight {
    fn drop(&mut self) {
        self.deleting.remove(&self.id);
    }
}

impl AssetPipeline {
    pub fn new(
        blobs: Arc<dyn BlobStore>,
        catalog: Arc<dyn AssetCatalog>,
        ledger: Arc<dyn QuotaLedger>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            blobs,
            catalog,
            ledger,
            settings,
            deleting: Arc::new(DashSet::new()),
        }
    }

    /// Validate and store a new original image.
    #[instrument(skip(self, input), fields(size = input.bytes.len()))]
    pub async fn upload(
        &self,
        owner_id: &str,
        input: UploadInput,
    ) -> Result<AssetSummary, PipelineError> {
        let declared = OutputFormat::from_mime(&input.mime_type).ok_or_else(|| {
            PipelineError::Validation(format!(
                "unsupported image type {:?}; expected one of image/jpeg, image/png, image/webp, image/avif",
                input.mime_type
            ))
        })?;

        let UploadInput {
            bytes,
            original_name,
            ..
        } = input;
        let (bytes, info) = tokio::task::spawn_blocking(move || {
            let info = imaging::probe(&bytes);
            (bytes, info)
        })
        .await?;
        let info = info?;

        let format = OutputFormat::from_mime(info.mime_type).unwrap_or(declared);
        if format != declared {
            debug!(%declared, detected = %format, "declared type differs from content");
        }

        let id = Uuid::now_v7();
        let key = StorageKey::for_upload(owner_id, &id.to_string(), format.extension())?;
        self.persist(Staged {
            id,
            owner_id: owner_id.to_owned(),
            key,
            original_name,
            mime_type: format.mime_type().to_owned(),
            bytes,
            width: info.width,
            height: info.height,
        })
        .await
    }

    /// Derive a new, independent asset from an existing one.
    #[instrument(skip(self, request))]
    pub async fn transform(
        &self,
        owner_id: &str,
        id: Uuid,
        request: TransformRequest,
    ) -> Result<AssetSummary, PipelineError> {
        let source = self.find(owner_id, id).await?;
        let bytes = self.read_blob(&source).await?;

        let output =
            tokio::task::spawn_blocking(move || imaging::transform(&bytes, &request)).await??;

        // A delete that committed while the codec ran wins.
        if self.catalog.find_by_id(id, owner_id).await?.is_none() {
            return Err(PipelineError::NotFound);
        }

        let new_id = Uuid::now_v7();
        let key =
            StorageKey::for_variant(owner_id, &new_id.to_string(), output.format.extension())?;
        self.persist(Staged {
            id: new_id,
            owner_id: owner_id.to_owned(),
            key,
            original_name: format!("transformed_{}", source.original_name),
            mime_type: output.format.mime_type().to_owned(),
            bytes: output.bytes,
            width: output.width,
            height: output.height,
        })
        .await
    }

    /// Record plus a signed, time-limited read URL.
    #[instrument(skip(self))]
    pub async fn details(&self, owner_id: &str, id: Uuid) -> Result<AssetDetails, PipelineError> {
        let asset = self.find(owner_id, id).await?;
        let key = key_of(&asset)?;
        if !self.bounded(self.blobs.exists(&key)).await? {
            return Err(self.missing_blob(&asset).await);
        }
        let url = self
            .bounded(self.blobs.signed_read_url(&key, self.settings.signed_url_ttl))
            .await?;
        Ok(AssetDetails {
            asset: asset.into(),
            url,
        })
    }

    /// Record metadata plus the stored bytes.
    #[instrument(skip(self))]
    pub async fn fetch_bytes(&self, owner_id: &str, id: Uuid) -> Result<AssetBytes, PipelineError> {
        let asset = self.find(owner_id, id).await?;
        let bytes = self.read_blob(&asset).await?;
        Ok(AssetBytes {
            bytes,
            mime_type: asset.mime_type,
            original_name: asset.original_name,
            content_hash: asset.content_hash,
        })
    }

    #[instrument(skip(self))]
    pub async fn list(&self, owner_id: &str, page: PageRequest) -> Result<AssetPage, PipelineError> {
        let (records, total) = self.catalog.list_by_owner(owner_id, &page).await?;
        Ok(AssetPage {
            data: records.into_iter().map(AssetSummary::from).collect(),
            pagination: Pagination::new(total, page.page, page.limit),
        })
    }

    /// Remove an asset's bytes, then its record, then its quota share.
    #[instrument(skip(self))]
    pub async fn delete(&self, owner_id: &str, id: Uuid) -> Result<(), PipelineError> {
        let asset = self.find(owner_id, id).await?;
        let in_flight = DeleteInFlight {
            deleting: self.deleting.clone(),
            id: asset.id,
        };
        self.deleting.insert(asset.id);
        let this = self.clone();
        // Once the blob delete starts, run to completion even if the caller goes away.
        tokio::spawn(async move {
            let result = this.remove(asset).await;
            drop(in_flight);
            result
        })
        .await?
    }

    #[instrument(skip(self))]
    pub async fn storage_usage(&self, owner_id: &str) -> Result<StorageUsage, PipelineError> {
        Ok(StorageUsage::new(self.ledger.current(owner_id).await?))
    }

    async fn find(&self, owner_id: &str, id: Uuid) -> Result<image_asset::Model, PipelineError> {
        self.catalog
            .find_by_id(id, owner_id)
            .await?
            .ok_or(PipelineError::NotFound)
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, StorageError>>,
    ) -> Result<T, StorageError> {
        tokio::time::timeout(self.settings.blob_timeout, call)
            .await
            .unwrap_or(Err(StorageError::Timeout(self.settings.blob_timeout)))
    }

    async fn read_blob(&self, asset: &image_asset::Model) -> Result<Vec<u8>, PipelineError> {
        let key = key_of(asset)?;
        match self.bounded(self.blobs.get(&key)).await {
            Ok(bytes) => Ok(bytes),
            Err(StorageError::NotFound(_)) => Err(self.missing_blob(asset).await),
            Err(e) => Err(e.into()),
        }
    }

    /// The bytes behind `asset` are gone. Either a concurrent delete won, or
    /// the catalog and blob store disagree.
    async fn missing_blob(&self, asset: &image_asset::Model) -> PipelineError {
        if self.deleting.contains(&asset.id) {
            debug!(asset_id = %asset.id, "blob removed by an in-flight delete");
            return PipelineError::NotFound;
        }
        match self.catalog.find_by_id(asset.id, &asset.owner_id).await {
            Ok(None) => PipelineError::NotFound,
            Ok(Some(_)) => {
                error!(
                    owner_id = %asset.owner_id,
                    asset_id = %asset.id,
                    storage_key = %asset.storage_key,
                    "catalog record references a missing blob"
                );
                PipelineError::StorageInconsistency(format!(
                    "image {} has no stored bytes",
                    asset.id
                ))
            }
            Err(e) => e.into(),
        }
    }

    async fn persist(&self, staged: Staged) -> Result<AssetSummary, PipelineError> {
        let this = self.clone();
        // Once the blob write starts, run to completion even if the caller goes away.
        tokio::spawn(async move { this.store(staged).await }).await?
    }

    async fn store(&self, staged: Staged) -> Result<AssetSummary, PipelineError> {
        let size = staged.bytes.len() as i64;
        let content_hash = ContentHash::compute(&staged.bytes).to_hex();

        if let Err(e) = self
            .bounded(self.blobs.put(&staged.key, &staged.bytes, &staged.mime_type))
            .await
        {
            if matches!(e, StorageError::Timeout(_)) {
                warn!(
                    owner_id = %staged.owner_id,
                    asset_id = %staged.id,
                    storage_key = %staged.key,
                    "blob write timed out; the object may still land without a record"
                );
            }
            return Err(e.into());
        }

        let record = NewAsset {
            id: staged.id,
            owner_id: staged.owner_id.clone(),
            storage_key: staged.key.to_string(),
            original_name: staged.original_name,
            mime_type: staged.mime_type,
            byte_size: size,
            width: i32::try_from(staged.width).unwrap_or(i32::MAX),
            height: i32::try_from(staged.height).unwrap_or(i32::MAX),
            content_hash,
        };
        let saved = match self.catalog.insert(record).await {
            Ok(saved) => saved,
            Err(e) => {
                error!(
                    owner_id = %staged.owner_id,
                    asset_id = %staged.id,
                    storage_key = %staged.key,
                    error = %e,
                    "catalog insert failed after blob write; blob is orphaned"
                );
                return Err(e.into());
            }
        };

        if let Err(e) = self.ledger.adjust(&saved.owner_id, size).await {
            error!(
                owner_id = %saved.owner_id,
                asset_id = %saved.id,
                storage_key = %saved.storage_key,
                delta = size,
                error = %e,
                "quota ledger not updated; ledger is inconsistent"
            );
        }

        info!(asset_id = %saved.id, storage_key = %saved.storage_key, size, "stored image");
        Ok(saved.into())
    }

    async fn remove(&self, asset: image_asset::Model) -> Result<(), PipelineError> {
        let key = key_of(&asset)?;

        if !self.bounded(self.blobs.delete(&key)).await? {
            warn!(
                owner_id = %asset.owner_id,
                asset_id = %asset.id,
                storage_key = %asset.storage_key,
                "blob already absent while deleting image"
            );
        }

        match self.catalog.delete(asset.id).await {
            Ok(true) => {}
            // A concurrent delete removed the record first and owns the ledger update.
            Ok(false) => return Err(PipelineError::NotFound),
            Err(e) => {
                error!(
                    owner_id = %asset.owner_id,
                    asset_id = %asset.id,
                    storage_key = %asset.storage_key,
                    error = %e,
                    "catalog delete failed after blob delete; record references a missing blob"
                );
                return Err(e.into());
            }
        }

        if let Err(e) = self.ledger.adjust(&asset.owner_id, -asset.byte_size).await {
            error!(
                owner_id = %asset.owner_id,
                asset_id = %asset.id,
                storage_key = %asset.storage_key,
                delta = -asset.byte_size,
                error = %e,
                "quota ledger not updated; ledger is inconsistent"
            );
        }

        info!(asset_id = %asset.id, storage_key = %asset.storage_key, "deleted image");
        Ok(())
    }
}

fn key_of(asset: &image_asset::Model) -> Result<StorageKey, PipelineError> {
    StorageKey::parse(asset.storage_key.as_str()).map_err(|e| {
        PipelineError::StorageInconsistency(format!("image {} has a bad storage key: {e}", asset.id))
    })
}
