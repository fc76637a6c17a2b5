use axum::Json;
use axum::body::Body;
use axum::extract::multipart::MultipartError;
use axum::extract::{DefaultBodyLimit, Multipart, Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use imaging::TransformRequest;
use tracing::instrument;
use uuid::Uuid;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::JsonOrDefault;
use crate::models::image::{
    AssetDetails, AssetPage, AssetSummary, ImageListQuery, MessageResponse, TransformImageRequest,
};
use crate::pipeline::{AssetBytes, UploadInput};
use crate::state::AppState;
use crate::utils::filename::{content_disposition_value, sanitize_upload_name};

/// Room for multipart boundaries and part headers on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn upload_body_limit(max_bytes: usize) -> DefaultBodyLimit {
    DefaultBodyLimit::max(max_bytes.saturating_add(MULTIPART_OVERHEAD))
}

#[utoipa::path(
    post,
    path = "/images/upload",
    tag = "Images",
    operation_id = "uploadImage",
    summary = "Upload an image",
    description = "Uploads one image in the `file` multipart field. Accepted types: JPEG, PNG, \
        WebP and AVIF, up to the configured size limit (10 MiB by default). The bytes are \
        fully decoded before anything is stored; the detected format wins over the declared one.",
    request_body(content_type = "multipart/form-data", description = "Image file in the `file` field"),
    responses(
        (status = 201, description = "Image stored", body = AssetSummary),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 413, description = "File too large (PAYLOAD_TOO_LARGE)", body = ErrorBody),
        (status = 422, description = "Not a decodable image (DECODE_ERROR)", body = ErrorBody),
        (status = 502, description = "Storage unavailable (TRANSPORT_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(owner_id = %auth_user.owner_id))]
pub async fn upload_image(
    auth_user: AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let limit = state.config.upload.max_bytes;
    let mut upload: Option<UploadInput> = None;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, limit))?
    {
        if field.name() != Some("file") {
            continue; // Ignore unknown fields.
        }

        let original_name = match field.file_name() {
            Some(name) => sanitize_upload_name(name)
                .map_err(|e| AppError::Validation(e.message().into()))?
                .to_owned(),
            None => "image".to_owned(),
        };
        let mime_type = field
            .content_type()
            .map(str::to_owned)
            .unwrap_or_else(|| {
                mime_guess::from_path(&original_name)
                    .first_or_octet_stream()
                    .to_string()
            });

        let mut bytes = Vec::new();
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| multipart_error(e, limit))?
        {
            if bytes.len() + chunk.len() > limit {
                return Err(AppError::PayloadTooLarge { limit });
            }
            bytes.extend_from_slice(&chunk);
        }

        upload = Some(UploadInput {
            bytes,
            original_name,
            mime_type,
        });
    }

    let input = upload.ok_or_else(|| AppError::Validation("Missing 'file' field".into()))?;
    if input.bytes.is_empty() {
        return Err(AppError::Validation("Uploaded file is empty".into()));
    }

    let asset = state.pipeline.upload(&auth_user.owner_id, input).await?;
    Ok((StatusCode::CREATED, Json(asset)))
}

#[utoipa::path(
    post,
    path = "/images/{id}/transform",
    tag = "Images",
    operation_id = "transformImage",
    summary = "Create a transformed copy of an image",
    description = "Applies crop, resize, rotate, flip and watermark in that fixed order, then \
        encodes to the requested format. The result is stored as a new, independent image; \
        the source is untouched. An empty body re-encodes the image as JPEG at quality 80.",
    params(("id" = String, Path, description = "Image ID (UUID)")),
    request_body = TransformImageRequest,
    responses(
        (status = 201, description = "Transformed image stored", body = AssetSummary),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Image not found (NOT_FOUND)", body = ErrorBody),
        (status = 422, description = "Transform failed (DECODE_ERROR, TRANSFORM_ERROR)", body = ErrorBody),
        (status = 502, description = "Storage unavailable (TRANSPORT_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, body), fields(owner_id = %auth_user.owner_id))]
pub async fn transform_image(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonOrDefault(body): JsonOrDefault<TransformImageRequest>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_image_id(&id)?;
    let request = TransformRequest::try_from(body)?;
    let asset = state
        .pipeline
        .transform(&auth_user.owner_id, id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(asset)))
}

#[utoipa::path(
    get,
    path = "/images",
    tag = "Images",
    operation_id = "listImages",
    summary = "List your images",
    description = "Returns one page of the caller's images. Sortable by `createdAt` (default, \
        desc), `updatedAt`, `originalName`, `mimeType`, `size`, `width` or `height`.",
    params(ImageListQuery),
    responses(
        (status = 200, description = "Page of images", body = AssetPage),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(owner_id = %auth_user.owner_id))]
pub async fn list_images(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ImageListQuery>,
) -> Result<Json<AssetPage>, AppError> {
    let page = query.into_page_request()?;
    Ok(Json(state.pipeline.list(&auth_user.owner_id, page).await?))
}

#[utoipa::path(
    get,
    path = "/images/{id}",
    tag = "Images",
    operation_id = "getImage",
    summary = "Get an image with a signed URL",
    description = "Returns the image metadata and a time-limited URL for reading its bytes.",
    params(("id" = String, Path, description = "Image ID (UUID)")),
    responses(
        (status = 200, description = "Image details", body = AssetDetails),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Image not found (NOT_FOUND)", body = ErrorBody),
        (status = 500, description = "Stored bytes missing (STORAGE_INCONSISTENCY)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(owner_id = %auth_user.owner_id))]
pub async fn get_image(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AssetDetails>, AppError> {
    let id = parse_image_id(&id)?;
    Ok(Json(state.pipeline.details(&auth_user.owner_id, id).await?))
}

#[utoipa::path(
    get,
    path = "/images/{id}/download",
    tag = "Images",
    operation_id = "downloadImage",
    summary = "Download an image",
    description = "Returns the stored bytes as an attachment under the original file name. \
        Supports ETag-based caching via If-None-Match.",
    params(("id" = String, Path, description = "Image ID (UUID)")),
    responses(
        (status = 200, description = "Image bytes"),
        (status = 304, description = "Not Modified (ETag match)"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Image not found (NOT_FOUND)", body = ErrorBody),
        (status = 500, description = "Stored bytes missing (STORAGE_INCONSISTENCY)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, headers), fields(owner_id = %auth_user.owner_id))]
pub async fn download_image(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let id = parse_image_id(&id)?;
    let asset = state.pipeline.fetch_bytes(&auth_user.owner_id, id).await?;
    bytes_response(asset, &headers, "attachment", "private, max-age=3600")
}

#[utoipa::path(
    get,
    path = "/images/{id}/view",
    tag = "Images",
    operation_id = "viewImage",
    summary = "View an image inline",
    description = "Returns the stored bytes for inline display. Stored images never change, so \
        the response is cacheable for a year.",
    params(("id" = String, Path, description = "Image ID (UUID)")),
    responses(
        (status = 200, description = "Image bytes"),
        (status = 304, description = "Not Modified (ETag match)"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Image not found (NOT_FOUND)", body = ErrorBody),
        (status = 500, description = "Stored bytes missing (STORAGE_INCONSISTENCY)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, headers), fields(owner_id = %auth_user.owner_id))]
pub async fn view_image(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let id = parse_image_id(&id)?;
    let asset = state.pipeline.fetch_bytes(&auth_user.owner_id, id).await?;
    bytes_response(asset, &headers, "inline", "public, max-age=31536000")
}

#[utoipa::path(
    delete,
    path = "/images/{id}",
    tag = "Images",
    operation_id = "deleteImage",
    summary = "Delete an image",
    description = "Removes the stored bytes, then the record, then refunds the caller's quota.",
    params(("id" = String, Path, description = "Image ID (UUID)")),
    responses(
        (status = 200, description = "Image deleted", body = MessageResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Image not found (NOT_FOUND)", body = ErrorBody),
        (status = 502, description = "Storage unavailable (TRANSPORT_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(owner_id = %auth_user.owner_id))]
pub async fn delete_image(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = parse_image_id(&id)?;
    state.pipeline.delete(&auth_user.owner_id, id).await?;
    Ok(Json(MessageResponse {
        message: "Image deleted successfully".into(),
    }))
}

fn parse_image_id(id: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(id).map_err(|_| AppError::Validation("Invalid image ID".into()))
}

fn multipart_error(err: MultipartError, limit: usize) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge { limit }
    } else {
        AppError::Validation(format!("Multipart error: {}", err.body_text()))
    }
}

fn bytes_response(
    asset: AssetBytes,
    headers: &HeaderMap,
    disposition: &str,
    cache_control: &str,
) -> Result<Response, AppError> {
    let etag_value = format!("\"{}\"", asset.content_hash);
    if let Some(if_none_match) = headers.get(header::IF_NONE_MATCH)
        && let Ok(val) = if_none_match.to_str()
        && (val == etag_value || val == "*")
    {
        return Ok(StatusCode::NOT_MODIFIED.into_response());
    }

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, &asset.mime_type)
        .header(header::CONTENT_LENGTH, asset.bytes.len().to_string())
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_value(disposition, &asset.original_name),
        )
        .header(header::ETAG, &etag_value)
        .header(header::CACHE_CONTROL, cache_control)
        .body(Body::from(asset.bytes))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))
}
