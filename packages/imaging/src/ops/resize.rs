use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgba, RgbaImage};

use super::check_pixels;
use crate::dimensions::{ResizePlan, plan_resize};
use crate::error::ImageError;
use crate::params::ResizeSpec;

/// Resample `img` according to `spec` with a Lanczos3 filter.
pub fn resize(img: DynamicImage, spec: &ResizeSpec) -> Result<DynamicImage, ImageError> {
    let Some(plan) = plan_resize(img.width(), img.height(), spec) else {
        return Ok(img);
    };
    let (out_w, out_h) = plan.output();
    check_pixels(out_w, out_h)?;

    let img = match plan {
        ResizePlan::Exact { width, height } => resample(img, width, height),
        ResizePlan::CropToFit {
            scaled: (sw, sh),
            target: (tw, th),
        } => {
            check_pixels(sw, sh)?;
            resample(img, sw, sh).crop_imm((sw - tw) / 2, (sh - th) / 2, tw, th)
        }
        ResizePlan::PadToFit {
            scaled: (sw, sh),
            target: (tw, th),
        } => {
            let scaled = resample(img, sw, sh).to_rgba8();
            let mut canvas = RgbaImage::from_pixel(tw, th, Rgba([0, 0, 0, 255]));
            imageops::overlay(
                &mut canvas,
                &scaled,
                ((tw - sw) / 2) as i64,
                ((th - sh) / 2) as i64,
            );
            DynamicImage::ImageRgba8(canvas)
        }
    };
    Ok(img)
}

fn resample(img: DynamicImage, width: u32, height: u32) -> DynamicImage {
    if img.width() == width && img.height() == height {
        return img;
    }
    img.resize_exact(width, height, FilterType::Lanczos3)
}
