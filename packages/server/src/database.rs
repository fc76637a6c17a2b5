use std::time::Duration;

use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr};
use sea_orm::sea_query::Index;
use tracing::{info, warn};

use crate::entity::image_asset;

pub async fn init_db(db_url: &str, max_connections: u32) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(db_url.to_owned());

    opt.max_connections(max_connections)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(300))
        .sqlx_logging(false);

    let db = Database::connect(opt).await?;
    db.get_schema_registry("asset_server::entity::*")
        .sync(&db)
        .await?;

    ensure_indexes(&db).await;

    Ok(db)
}

/// Ensure the composite index behind owner listings exists.
///
/// Schema sync does not create composite non-unique indexes, so it is
/// created here. Failure only costs query speed and is logged.
pub async fn ensure_indexes(db: &DatabaseConnection) {
    // SELECT ... FROM image_asset WHERE owner_id = ? ORDER BY created_at
    let stmt = Index::create()
        .if_not_exists()
        .name("idx_image_asset_owner_created")
        .table(image_asset::Entity)
        .col(image_asset::Column::OwnerId)
        .col(image_asset::Column::CreatedAt)
        .to_owned();
    let sql = db.get_database_backend().build(&stmt).sql;

    match db.execute_unprepared(&sql).await {
        Ok(_) => info!("Ensured index idx_image_asset_owner_created exists"),
        Err(e) => warn!("Failed to create index idx_image_asset_owner_created: {}", e),
    }
}
