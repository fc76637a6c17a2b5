use tracing::debug;

use crate::decode::decode_image;
use crate::encode::encode_image;
use crate::error::ImageError;
use crate::ops;
use crate::params::{OutputFormat, TransformRequest};

/// Result of [`transform`].
#[derive(Debug, Clone)]
pub struct TransformOutput {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: OutputFormat,
}

/// Dimensions and container of a decodable image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    pub mime_type: &'static str,
}

/// Fully decode `bytes` and report what they contain.
pub fn probe(bytes: &[u8]) -> Result<ImageInfo, ImageError> {
    let (img, format) = decode_image(bytes)?;
    Ok(ImageInfo {
        width: img.width(),
        height: img.height(),
        mime_type: format.to_mime_type(),
    })
}

/// Decode `bytes`, run every step of `request` in order and re-encode.
pub fn transform(bytes: &[u8], request: &TransformRequest) -> Result<TransformOutput, ImageError> {
    let (mut img, _) = decode_image(bytes)?;
    for step in request.plan() {
        img = ops::apply(img, &step)?;
    }
    let width = img.width();
    let height = img.height();
    let bytes = encode_image(&img, request.format, request.quality)?;
    debug!(
        width,
        height,
        format = %request.format,
        size = bytes.len(),
        "transformed image"
    );
    Ok(TransformOutput {
        bytes,
        width,
        height,
        format: request.format,
    })
}
