use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::constants::DEFAULT_QUALITY;

/// Output encoding of a transform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Jpeg,
    Png,
    Webp,
    Avif,
}

impl OutputFormat {
    pub const ALL: [Self; 4] = [Self::Jpeg, Self::Png, Self::Webp, Self::Avif];

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "jpeg" | "jpg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "webp" => Some(Self::Webp),
            "avif" => Some(Self::Avif),
            _ => None,
        }
    }

    /// Map a MIME type such as `image/png` to a format.
    pub fn from_mime(mime: &str) -> Option<Self> {
        mime.strip_prefix("image/").and_then(Self::parse)
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Webp => "image/webp",
            Self::Avif => "image/avif",
        }
    }

    /// File extension used in storage keys.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::Webp => "webp",
            Self::Avif => "avif",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// How a resize fits the source into the requested box.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FitPolicy {
    /// Preserve aspect ratio, letterbox onto a black canvas of exactly the box size.
    Contain,
    /// Preserve aspect ratio, fill the box and crop the overflow from the centre.
    #[default]
    Cover,
    /// Stretch to exactly the box size.
    Fill,
    /// Largest aspect-preserving size that fits inside the box.
    Inside,
    /// Smallest aspect-preserving size that covers the box.
    Outside,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FlipAxis {
    Horizontal,
    Vertical,
    Both,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ResizeSpec {
    pub width: Option<u32>,
    pub height: Option<u32>,
    #[serde(default)]
    pub fit: FitPolicy,
}

impl ResizeSpec {
    fn is_noop(&self) -> bool {
        self.width.is_none() && self.height.is_none()
    }
}

/// One transform, consumed once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TransformRequest {
    pub crop: Option<CropRect>,
    pub resize: Option<ResizeSpec>,
    /// Clockwise degrees in `[0, 360]`.
    pub rotate: Option<u16>,
    pub flip: Option<FlipAxis>,
    pub format: OutputFormat,
    pub quality: u8,
    pub watermark: Option<String>,
}

impl Default for TransformRequest {
    fn default() -> Self {
        Self {
            crop: None,
            resize: None,
            rotate: None,
            flip: None,
            format: OutputFormat::Jpeg,
            quality: DEFAULT_QUALITY,
            watermark: None,
        }
    }
}

/// A single geometric or photometric step, in application order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransformStep {
    Crop(CropRect),
    Resize(ResizeSpec),
    /// Clockwise degrees in `1..360`.
    Rotate(u16),
    Flip(FlipAxis),
    Watermark(String),
}

impl TransformRequest {
    /// The steps to run before encoding. Absent parameters contribute nothing.
    pub fn plan(&self) -> Vec<TransformStep> {
        let mut steps = Vec::with_capacity(5);
        if let Some(crop) = self.crop {
            steps.push(TransformStep::Crop(crop));
        }
        if let Some(resize) = self.resize.filter(|r| !r.is_noop()) {
            steps.push(TransformStep::Resize(resize));
        }
        if let Some(degrees) = self.rotate.map(|d| d % 360).filter(|d| *d != 0) {
            steps.push(TransformStep::Rotate(degrees));
        }
        if let Some(axis) = self.flip {
            steps.push(TransformStep::Flip(axis));
        }
        if let Some(text) = self.watermark.as_ref().filter(|t| !t.is_empty()) {
            steps.push(TransformStep::Watermark(text.clone()));
        }
        steps
    }
}
