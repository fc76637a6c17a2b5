use std::io::Cursor;

use image::{DynamicImage, ImageFormat, ImageReader};

use crate::error::ImageError;

/// Decode encoded bytes, sniffing the container from its magic number.
pub(crate) fn decode_image(bytes: &[u8]) -> Result<(DynamicImage, ImageFormat), ImageError> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| ImageError::Decode(format!("failed to read input: {e}")))?;
    let format = reader
        .format()
        .ok_or_else(|| ImageError::Decode("unrecognised image format".into()))?;
    let img = reader
        .decode()
        .map_err(|e| ImageError::Decode(format!("{format:?}: {e}")))?;
    Ok((img, format))
}
