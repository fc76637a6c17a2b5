//! Individual transform steps. Each takes ownership of the image and
//! returns the transformed one.

mod crop;
mod flip;
mod resize;
mod rotate;
mod watermark;

pub use crop::crop;
pub use flip::flip;
pub use resize::resize;
pub use rotate::rotate;
pub use watermark::watermark;

use image::DynamicImage;

use crate::constants::MAX_PIXELS;
use crate::error::ImageError;
use crate::params::TransformStep;

/// Apply one planned step.
pub fn apply(img: DynamicImage, step: &TransformStep) -> Result<DynamicImage, ImageError> {
    match step {
        TransformStep::Crop(rect) => crop(img, rect),
        TransformStep::Resize(spec) => resize(img, spec),
        TransformStep::Rotate(degrees) => rotate(img, *degrees),
        TransformStep::Flip(axis) => Ok(flip(img, *axis)),
        TransformStep::Watermark(text) => Ok(watermark(img, text)),
    }
}

pub(crate) fn check_pixels(width: u32, height: u32) -> Result<(), ImageError> {
    if width as u64 * height as u64 > MAX_PIXELS {
        return Err(ImageError::Transform(format!(
            "image resolution exceeds maximum ({width}x{height})"
        )));
    }
    Ok(())
}
