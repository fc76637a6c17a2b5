use image::{DynamicImage, Rgba, RgbaImage};

use super::check_pixels;
use crate::error::ImageError;

const BACKGROUND: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Rotate `img` clockwise by `degrees`.
///
/// Right angles are exact. Any other angle grows the canvas to the rotated
/// bounding box and fills the uncovered corners with opaque black.
pub fn rotate(img: DynamicImage, degrees: u16) -> Result<DynamicImage, ImageError> {
    match degrees % 360 {
        0 => Ok(img),
        90 => Ok(img.rotate90()),
        180 => Ok(img.rotate180()),
        270 => Ok(img.rotate270()),
        other => rotate_arbitrary(&img.to_rgba8(), other as f64).map(DynamicImage::ImageRgba8),
    }
}

fn rotate_arbitrary(src: &RgbaImage, degrees: f64) -> Result<RgbaImage, ImageError> {
    let (sw, sh) = (src.width() as f64, src.height() as f64);
    let (sin, cos) = degrees.to_radians().sin_cos();

    let out_w = ((sw * cos.abs() + sh * sin.abs()).round() as u32).max(1);
    let out_h = ((sw * sin.abs() + sh * cos.abs()).round() as u32).max(1);
    check_pixels(out_w, out_h)?;

    let (src_cx, src_cy) = (sw / 2.0, sh / 2.0);
    let (out_cx, out_cy) = (out_w as f64 / 2.0, out_h as f64 / 2.0);

    Ok(RgbaImage::from_fn(out_w, out_h, |x, y| {
        let dx = x as f64 + 0.5 - out_cx;
        let dy = y as f64 + 0.5 - out_cy;
        // Inverse of a clockwise rotation in y-down coordinates.
        let sx = dx * cos + dy * sin + src_cx - 0.5;
        let sy = -dx * sin + dy * cos + src_cy - 0.5;
        sample_bilinear(src, sx, sy)
    }))
}

fn sample_bilinear(src: &RgbaImage, x: f64, y: f64) -> Rgba<u8> {
    if x <= -1.0 || y <= -1.0 || x >= src.width() as f64 || y >= src.height() as f64 {
        return BACKGROUND;
    }
    let (x0, y0) = (x.floor(), y.floor());
    let (fx, fy) = (x - x0, y - y0);
    let (x0, y0) = (x0 as i64, y0 as i64);

    let px = |px: i64, py: i64| -> [f64; 4] {
        let p = if px < 0 || py < 0 || px >= src.width() as i64 || py >= src.height() as i64 {
            BACKGROUND
        } else {
            *src.get_pixel(px as u32, py as u32)
        };
        p.0.map(f64::from)
    };

    let (a, b, c, d) = (px(x0, y0), px(x0 + 1, y0), px(x0, y0 + 1), px(x0 + 1, y0 + 1));
    let mut out = [0u8; 4];
    for i in 0..4 {
        let top = a[i] + (b[i] - a[i]) * fx;
        let bottom = c[i] + (d[i] - c[i]) * fx;
        out[i] = (top + (bottom - top) * fy).round().clamp(0.0, 255.0) as u8;
    }
    Rgba(out)
}
