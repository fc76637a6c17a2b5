use image::DynamicImage;

use crate::error::ImageError;
use crate::params::CropRect;

/// Cut `rect` out of `img`. The rectangle must lie inside the image; it is
/// never clamped.
pub fn crop(img: DynamicImage, rect: &CropRect) -> Result<DynamicImage, ImageError> {
    if rect.width == 0 || rect.height == 0 {
        return Err(ImageError::transform("crop width and height must be at least 1"));
    }
    let right = rect.x as u64 + rect.width as u64;
    let bottom = rect.y as u64 + rect.height as u64;
    if right > img.width() as u64 || bottom > img.height() as u64 {
        return Err(ImageError::Transform(format!(
            "crop rectangle {}x{}+{}+{} exceeds image bounds {}x{}",
            rect.width,
            rect.height,
            rect.x,
            rect.y,
            img.width(),
            img.height()
        )));
    }
    Ok(img.crop_imm(rect.x, rect.y, rect.width, rect.height))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x: u32, y: u32, width: u32, height: u32) -> CropRect {
        CropRect {
            x,
            y,
            width,
            height,
        }
    }

    #[test]
    fn crops_to_rectangle() {
        let out = crop(DynamicImage::new_rgb8(400, 300), &rect(10, 20, 100, 50)).unwrap();
        assert_eq!((out.width(), out.height()), (100, 50));
    }

    #[test]
    fn full_image_is_in_bounds() {
        let out = crop(DynamicImage::new_rgb8(40, 30), &rect(0, 0, 40, 30)).unwrap();
        assert_eq!((out.width(), out.height()), (40, 30));
    }

    #[test]
    fn rejects_overflowing_rectangles() {
        let img = DynamicImage::new_rgb8(40, 30);
        assert!(crop(img.clone(), &rect(1, 0, 40, 30)).is_err());
        assert!(crop(img.clone(), &rect(0, 1, 40, 30)).is_err());
        assert!(crop(img, &rect(u32::MAX, 0, u32::MAX, 1)).is_err());
    }

    #[test]
    fn rejects_empty_rectangles() {
        assert!(crop(DynamicImage::new_rgb8(4, 4), &rect(0, 0, 0, 1)).is_err());
    }
}
