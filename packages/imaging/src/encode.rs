use std::io::Cursor;

use image::DynamicImage;
use image::codecs::avif::AvifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;

use crate::constants::AVIF_SPEED;
use crate::error::ImageError;
use crate::params::OutputFormat;

/// Encode `img` as `format`.
///
/// `quality` (1-100) drives the JPEG and AVIF encoders. PNG and WebP are
/// written losslessly and ignore it.
pub fn encode_image(
    img: &DynamicImage,
    format: OutputFormat,
    quality: u8,
) -> Result<Vec<u8>, ImageError> {
    let quality = quality.clamp(1, 100);
    let mut buf = Cursor::new(Vec::new());

    let result = match format {
        OutputFormat::Jpeg => {
            let encoder = JpegEncoder::new_with_quality(&mut buf, quality);
            img.to_rgb8().write_with_encoder(encoder)
        }
        OutputFormat::Png => img.write_with_encoder(PngEncoder::new(&mut buf)),
        OutputFormat::Webp => {
            let encoder = WebPEncoder::new_lossless(&mut buf);
            img.to_rgba8().write_with_encoder(encoder)
        }
        OutputFormat::Avif => {
            let encoder = AvifEncoder::new_with_speed_quality(&mut buf, AVIF_SPEED, quality);
            img.to_rgba8().write_with_encoder(encoder)
        }
    };
    result.map_err(|e| ImageError::Transform(format!("{format} encode failed: {e}")))?;

    Ok(buf.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jpeg_magic() {
        let data = encode_image(&DynamicImage::new_rgb8(10, 10), OutputFormat::Jpeg, 80).unwrap();
        assert_eq!(&data[0..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn png_magic() {
        let data = encode_image(&DynamicImage::new_rgba8(10, 10), OutputFormat::Png, 80).unwrap();
        assert_eq!(&data[0..8], &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]);
    }

    #[test]
    fn webp_is_riff() {
        let data = encode_image(&DynamicImage::new_rgb8(10, 10), OutputFormat::Webp, 80).unwrap();
        assert_eq!(&data[0..4], b"RIFF");
        assert_eq!(&data[8..12], b"WEBP");
    }

    #[test]
    fn avif_has_ftyp_box() {
        let data = encode_image(&DynamicImage::new_rgb8(10, 10), OutputFormat::Avif, 60).unwrap();
        assert_eq!(&data[4..8], b"ftyp");
    }

    #[test]
    fn jpeg_quality_changes_size() {
        let img = DynamicImage::ImageRgb8(image::RgbImage::from_fn(64, 64, |x, y| {
            image::Rgb([(x * 4) as u8, (y * 4) as u8, ((x ^ y) * 4) as u8])
        }));
        let low = encode_image(&img, OutputFormat::Jpeg, 10).unwrap();
        let high = encode_image(&img, OutputFormat::Jpeg, 95).unwrap();
        assert!(low.len() < high.len());
    }

    #[test]
    fn out_of_range_quality_is_clamped() {
        assert!(encode_image(&DynamicImage::new_rgb8(4, 4), OutputFormat::Jpeg, 0).is_ok());
    }
}
