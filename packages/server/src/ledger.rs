use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::{Expr, ExprTrait, OnConflict};
use sea_orm::*;
use thiserror::Error;
use tracing::warn;

use crate::entity::owner_quota;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("quota ledger unavailable: {0}")]
    Database(#[from] DbErr),
}

/// Outcome of a ledger adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Adjustment {
    /// Counter value after the adjustment.
    pub total: i64,
    /// The counter would have gone negative and was reset to zero. The
    /// ledger has drifted from the catalog and needs reconciling.
    pub clamped: bool,
}

/// Per-owner stored-byte counters.
#[async_trait]
pub trait QuotaLedger: Send + Sync {
    /// Atomically add `delta` (may be negative) to the owner's counter.
    async fn adjust(&self, owner_id: &str, delta: i64) -> Result<Adjustment, LedgerError>;

    /// Current counter value; 0 for owners never seen.
    async fn current(&self, owner_id: &str) -> Result<i64, LedgerError>;
}

/// [`QuotaLedger`] backed by the `owner_quota` table.
#[derive(Clone)]
pub struct DbQuotaLedger {
    db: DatabaseConnection,
}

impl DbQuotaLedger {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl QuotaLedger for DbQuotaLedger {
    async fn adjust(&self, owner_id: &str, delta: i64) -> Result<Adjustment, LedgerError> {
        let now = Utc::now();

        // The upsert locks the owner's row until commit, so the clamp and the
        // returned total only ever see this call's delta.
        let txn = self.db.begin().await?;

        let row = owner_quota::ActiveModel {
            owner_id: Set(owner_id.to_owned()),
            total_storage_used: Set(delta),
            updated_at: Set(now),
        };
        owner_quota::Entity::insert(row)
            .on_conflict(
                OnConflict::column(owner_quota::Column::OwnerId)
                    .value(
                        owner_quota::Column::TotalStorageUsed,
                        Expr::col((owner_quota::Entity, owner_quota::Column::TotalStorageUsed))
                            .add(delta),
                    )
                    .value(owner_quota::Column::UpdatedAt, Expr::value(now))
                    .to_owned(),
            )
            .exec_without_returning(&txn)
            .await?;

        let total = owner_quota::Entity::find_by_id(owner_id.to_owned())
            .one(&txn)
            .await?
            .map(|row| row.total_storage_used)
            .unwrap_or(0);

        let clamped = total < 0;
        if clamped {
            owner_quota::Entity::update_many()
                .col_expr(owner_quota::Column::TotalStorageUsed, Expr::value(0i64))
                .filter(owner_quota::Column::OwnerId.eq(owner_id))
                .exec(&txn)
                .await?;
        }

        txn.commit().await?;

        if clamped {
            warn!(
                owner_id,
                delta, "quota ledger would have gone negative; clamped to zero"
            );
        }
        Ok(Adjustment {
            total: if clamped { 0 } else { total },
            clamped,
        })
    }

    async fn current(&self, owner_id: &str) -> Result<i64, LedgerError> {
        Ok(owner_quota::Entity::find_by_id(owner_id.to_owned())
            .one(&self.db)
            .await?
            .map(|row| row.total_storage_used)
            .unwrap_or(0))
    }
}
