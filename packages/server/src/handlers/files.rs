use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::Response;
use chrono::Utc;
use common::storage::{StorageError, StorageKey};
use serde::Deserialize;
use tracing::{instrument, warn};

use crate::error::AppError;
use crate::pipeline::PipelineError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SignedQuery {
    pub expires: Option<i64>,
    pub signature: Option<String>,
}

/// Serve an object through a URL issued by the store's [`common::storage::UrlSigner`].
///
/// Not authenticated with a bearer token: the signature is the credential.
#[instrument(skip(state, query))]
pub async fn serve_signed_file(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<SignedQuery>,
) -> Result<Response, AppError> {
    let signer = state
        .url_signer
        .as_ref()
        .ok_or_else(|| AppError::NotFound("File not found".into()))?;

    let (Some(expires), Some(signature)) = (query.expires, query.signature) else {
        return Err(AppError::TokenMissing);
    };
    signer.verify(&key, expires, &signature).map_err(|e| {
        warn!(error = %e, "rejected signed file request");
        AppError::TokenInvalid
    })?;

    let key = StorageKey::parse(key).map_err(|e| AppError::Validation(e.to_string()))?;
    let timeout = state.config.storage.request_timeout();
    let bytes = tokio::time::timeout(timeout, state.blob_store.get(&key))
        .await
        .unwrap_or(Err(StorageError::Timeout(timeout)))
        .map_err(|e| match e {
            StorageError::NotFound(_) => AppError::NotFound("File not found".into()),
            other => PipelineError::from(other).into(),
        })?;

    let max_age = (expires - Utc::now().timestamp()).max(0);
    let mime = mime_guess::from_path(key.as_str()).first_or_octet_stream();

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, mime.as_ref())
        .header(header::CONTENT_LENGTH, bytes.len().to_string())
        .header(header::CACHE_CONTROL, format!("private, max-age={max_age}"))
        .body(Body::from(bytes))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))
}
