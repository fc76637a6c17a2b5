use axum::Json;
use axum::extract::State;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::models::image::StorageUsage;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/storage",
    tag = "Storage",
    operation_id = "getStorageUsage",
    summary = "Get your storage usage",
    description = "Returns the total bytes currently attributed to the caller across all stored images.",
    responses(
        (status = 200, description = "Storage usage", body = StorageUsage),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 502, description = "Quota ledger unavailable (TRANSPORT_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(owner_id = %auth_user.owner_id))]
pub async fn get_storage_usage(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<StorageUsage>, AppError> {
    Ok(Json(
        state.pipeline.storage_usage(&auth_user.owner_id).await?,
    ))
}
