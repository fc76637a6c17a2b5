use chrono::{DateTime, Utc};
use imaging::{CropRect, FitPolicy, FlipAxis, OutputFormat, ResizeSpec, TransformRequest};
use serde::{Deserialize, Serialize};

use crate::catalog::{PageRequest, SortField, SortOrder};
use crate::entity::image_asset;
use crate::error::AppError;
use crate::models::shared::Pagination;

const MAX_DIMENSION: u32 = 5000;

/// Response DTO for a single stored image.
#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssetSummary {
    /// Image ID (UUIDv7).
    #[schema(example = "01936f0e-1234-7abc-8000-000000000001")]
    pub id: String,
    pub owner_id: String,
    /// Generated file name, `{id}.{ext}`.
    #[schema(example = "01936f0e-1234-7abc-8000-000000000001.jpeg")]
    pub file_name: String,
    #[schema(example = "holiday.jpg")]
    pub original_name: String,
    #[schema(example = "image/jpeg")]
    pub mime_type: String,
    /// Size in bytes.
    #[schema(example = 142857)]
    pub size: i64,
    #[schema(example = "139.51 KB")]
    pub size_label: String,
    pub width: i32,
    pub height: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<image_asset::Model> for AssetSummary {
    fn from(model: image_asset::Model) -> Self {
        let file_name = model
            .storage_key
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_owned();
        Self {
            id: model.id.to_string(),
            owner_id: model.owner_id,
            file_name,
            original_name: model.original_name,
            mime_type: model.mime_type,
            size: model.byte_size,
            size_label: kilobytes_label(model.byte_size),
            width: model.width,
            height: model.height,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// A stored image plus a time-limited read URL.
#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
pub struct AssetDetails {
    #[serde(flatten)]
    pub asset: AssetSummary,
    /// Signed URL, valid for the configured lifetime.
    pub url: String,
}

/// Response DTO for listing images.
#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
pub struct AssetPage {
    pub data: Vec<AssetSummary>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StorageUsage {
    /// Bytes currently attributed to the caller.
    #[schema(example = 1048576)]
    pub total_storage_used: i64,
    #[schema(example = "1.00 MB")]
    pub total_storage_used_mb: String,
}

impl StorageUsage {
    pub fn new(total_storage_used: i64) -> Self {
        Self {
            total_storage_used,
            total_storage_used_mb: format!(
                "{:.2} MB",
                total_storage_used as f64 / (1024.0 * 1024.0)
            ),
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct MessageResponse {
    #[schema(example = "Image deleted successfully")]
    pub message: String,
}

pub fn kilobytes_label(bytes: i64) -> String {
    format!("{:.2} KB", bytes as f64 / 1024.0)
}

/// Query parameters for listing images.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ImageListQuery {
    /// Items per page (1-100, default 10).
    pub limit: Option<u64>,
    /// Page number (>= 1, default 1).
    pub page: Option<u64>,
    /// One of `createdAt` (default), `updatedAt`, `originalName`, `mimeType`,
    /// `size`, `width`, `height`.
    pub sort_by: Option<String>,
    /// `asc` or `desc` (default).
    pub sort_order: Option<String>,
}

impl ImageListQuery {
    pub fn into_page_request(self) -> Result<PageRequest, AppError> {
        let limit = self.limit.unwrap_or(10);
        if !(1..=100).contains(&limit) {
            return Err(AppError::Validation("limit must be between 1 and 100".into()));
        }
        let page = self.page.unwrap_or(1);
        if page < 1 {
            return Err(AppError::Validation("page must be >= 1".into()));
        }
        let sort_field = match self.sort_by.as_deref() {
            None => SortField::default(),
            Some(s) => SortField::parse(s).ok_or_else(|| {
                AppError::Validation(format!("sortBy must be one of: {}", SortField::NAMES))
            })?,
        };
        let sort_order = match self.sort_order.as_deref() {
            None => SortOrder::default(),
            Some(s) => SortOrder::parse(s)
                .ok_or_else(|| AppError::Validation("sortOrder must be asc or desc".into()))?,
        };
        Ok(PageRequest {
            page,
            limit,
            sort_field,
            sort_order,
        })
    }
}

/// Body of a transform request. Every field is optional.
#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TransformImageRequest {
    /// Target width (1-5000).
    pub width: Option<u32>,
    /// Target height (1-5000).
    pub height: Option<u32>,
    /// Default `cover`.
    pub fit: Option<FitPolicy>,
    /// Clockwise degrees (0-360).
    pub rotate: Option<u16>,
    pub flip: Option<FlipAxis>,
    /// Default `jpeg`.
    pub format: Option<OutputFormat>,
    /// Encoder quality (1-100, default 80).
    pub quality: Option<u8>,
    /// Crop origin (0-5000). All four crop fields go together.
    pub crop_x: Option<u32>,
    pub crop_y: Option<u32>,
    /// Crop size (1-5000).
    pub crop_width: Option<u32>,
    pub crop_height: Option<u32>,
    pub watermark_text: Option<String>,
}

fn check_range(name: &str, value: Option<u32>, min: u32, max: u32) -> Result<(), AppError> {
    match value {
        Some(v) if v < min || v > max => Err(AppError::Validation(format!(
            "{name} must be between {min} and {max}"
        ))),
        _ => Ok(()),
    }
}

impl TryFrom<TransformImageRequest> for TransformRequest {
    type Error = AppError;

    fn try_from(req: TransformImageRequest) -> Result<Self, Self::Error> {
        check_range("width", req.width, 1, MAX_DIMENSION)?;
        check_range("height", req.height, 1, MAX_DIMENSION)?;
        check_range("rotate", req.rotate.map(u32::from), 0, 360)?;
        check_range("quality", req.quality.map(u32::from), 1, 100)?;
        check_range("cropX", req.crop_x, 0, MAX_DIMENSION)?;
        check_range("cropY", req.crop_y, 0, MAX_DIMENSION)?;
        check_range("cropWidth", req.crop_width, 1, MAX_DIMENSION)?;
        check_range("cropHeight", req.crop_height, 1, MAX_DIMENSION)?;

        let crop = match (req.crop_x, req.crop_y, req.crop_width, req.crop_height) {
            (Some(x), Some(y), Some(width), Some(height)) => Some(CropRect {
                x,
                y,
                width,
                height,
            }),
            (None, None, None, None) => None,
            _ => {
                return Err(AppError::Validation(
                    "cropX, cropY, cropWidth and cropHeight must be given together".into(),
                ));
            }
        };

        let resize = (req.width.is_some() || req.height.is_some()).then(|| ResizeSpec {
            width: req.width,
            height: req.height,
            fit: req.fit.unwrap_or_default(),
        });

        let defaults = TransformRequest::default();
        Ok(TransformRequest {
            crop,
            resize,
            rotate: req.rotate,
            flip: req.flip,
            format: req.format.unwrap_or(defaults.format),
            quality: req.quality.unwrap_or(defaults.quality),
            watermark: req.watermark_text.filter(|t| !t.is_empty()),
        })
    }
}
