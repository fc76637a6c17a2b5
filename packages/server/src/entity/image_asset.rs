use common::AssetStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "image_asset")]
pub struct Model {
    /// UUIDv7 primary key.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Owning principal. No back-reference is kept on the owner side.
    pub owner_id: String,

    /// Blob store key holding the encoded bytes.
    #[sea_orm(unique)]
    pub storage_key: String,

    pub original_name: String,

    pub mime_type: String,

    /// Length of the bytes at `storage_key` when the record was written.
    pub byte_size: i64,

    pub width: i32,

    pub height: i32,

    /// Hex SHA-256 of the stored bytes.
    pub content_hash: String,

    pub status: AssetStatus,

    pub created_at: DateTimeUtc,

    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
