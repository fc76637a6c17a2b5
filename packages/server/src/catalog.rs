use async_trait::async_trait;
use chrono::Utc;
use common::AssetStatus;
use sea_orm::*;
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use crate::entity::image_asset;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog unavailable: {0}")]
    Database(#[from] DbErr),
}

/// Sortable columns of an owner listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    #[default]
    CreatedAt,
    UpdatedAt,
    OriginalName,
    MimeType,
    #[serde(alias = "size")]
    ByteSize,
    Width,
    Height,
}

impl SortField {
    pub const NAMES: &'static str =
        "createdAt, updatedAt, originalName, mimeType, size, byteSize, width, height";

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "createdAt" => Some(Self::CreatedAt),
            "updatedAt" => Some(Self::UpdatedAt),
            "originalName" => Some(Self::OriginalName),
            "mimeType" => Some(Self::MimeType),
            "size" | "byteSize" => Some(Self::ByteSize),
            "width" => Some(Self::Width),
            "height" => Some(Self::Height),
            _ => None,
        }
    }

    fn column(self) -> image_asset::Column {
        match self {
            Self::CreatedAt => image_asset::Column::CreatedAt,
            Self::UpdatedAt => image_asset::Column::UpdatedAt,
            Self::OriginalName => image_asset::Column::OriginalName,
            Self::MimeType => image_asset::Column::MimeType,
            Self::ByteSize => image_asset::Column::ByteSize,
            Self::Width => image_asset::Column::Width,
            Self::Height => image_asset::Column::Height,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }
}

impl From<SortOrder> for Order {
    fn from(order: SortOrder) -> Self {
        match order {
            SortOrder::Asc => Order::Asc,
            SortOrder::Desc => Order::Desc,
        }
    }
}

/// A page of an owner listing. `page` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
    pub sort_field: SortField,
    pub sort_order: SortOrder,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 10,
            sort_field: SortField::default(),
            sort_order: SortOrder::default(),
        }
    }
}

/// Fields of a record about to be created. The catalog assigns timestamps.
#[derive(Debug, Clone)]
pub struct NewAsset {
    pub id: Uuid,
    pub owner_id: String,
    pub storage_key: String,
    pub original_name: String,
    pub mime_type: String,
    pub byte_size: i64,
    pub width: i32,
    pub height: i32,
    pub content_hash: String,
}

/// Image metadata records, always scoped to their owner on read.
#[async_trait]
pub trait AssetCatalog: Send + Sync {
    async fn insert(&self, asset: NewAsset) -> Result<image_asset::Model, CatalogError>;

    /// Look up an active record. A record owned by someone else is `None`.
    async fn find_by_id(
        &self,
        id: Uuid,
        owner_id: &str,
    ) -> Result<Option<image_asset::Model>, CatalogError>;

    /// One page of the owner's active records plus the total count.
    async fn list_by_owner(
        &self,
        owner_id: &str,
        page: &PageRequest,
    ) -> Result<(Vec<image_asset::Model>, u64), CatalogError>;

    /// Remove a record. Returns whether it existed.
    async fn delete(&self, id: Uuid) -> Result<bool, CatalogError>;
}

/// [`AssetCatalog`] backed by the `image_asset` table.
#[derive(Clone)]
pub struct DbAssetCatalog {
    db: DatabaseConnection,
}

impl DbAssetCatalog {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn owned_by(owner_id: &str) -> Select<image_asset::Entity> {
        image_asset::Entity::find()
            .filter(image_asset::Column::OwnerId.eq(owner_id))
            .filter(image_asset::Column::Status.eq(AssetStatus::Active))
    }
}

#[async_trait]
impl AssetCatalog for DbAssetCatalog {
    async fn insert(&self, asset: NewAsset) -> Result<image_asset::Model, CatalogError> {
        let now = Utc::now();
        let model = image_asset::ActiveModel {
            id: Set(asset.id),
            owner_id: Set(asset.owner_id),
            storage_key: Set(asset.storage_key),
            original_name: Set(asset.original_name),
            mime_type: Set(asset.mime_type),
            byte_size: Set(asset.byte_size),
            width: Set(asset.width),
            height: Set(asset.height),
            content_hash: Set(asset.content_hash),
            status: Set(AssetStatus::Active),
            created_at: Set(now),
            updated_at: Set(now),
        };
        Ok(model.insert(&self.db).await?)
    }

    async fn find_by_id(
        &self,
        id: Uuid,
        owner_id: &str,
    ) -> Result<Option<image_asset::Model>, CatalogError> {
        Ok(Self::owned_by(owner_id)
            .filter(image_asset::Column::Id.eq(id))
            .one(&self.db)
            .await?)
    }

    async fn list_by_owner(
        &self,
        owner_id: &str,
        page: &PageRequest,
    ) -> Result<(Vec<image_asset::Model>, u64), CatalogError> {
        let limit = Ord::max(page.limit, 1);
        let select = Self::owned_by(owner_id);

        let total = select.clone().paginate(&self.db, limit).num_items().await?;

        let data = select
            .order_by(page.sort_field.column(), page.sort_order.into())
            // Ties fall back to id so pages never overlap.
            .order_by(image_asset::Column::Id, Order::Asc)
            .offset(Some((Ord::max(page.page, 1) - 1) * limit))
            .limit(Some(limit))
            .all(&self.db)
            .await?;

        Ok((data, total))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, CatalogError> {
        let result = image_asset::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(result.rows_affected > 0)
    }
}
