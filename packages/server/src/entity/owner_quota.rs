use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "owner_quota")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub owner_id: String,

    /// Cumulative bytes stored by the owner. Advisory only.
    pub total_storage_used: i64,

    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
