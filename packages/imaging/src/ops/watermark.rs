use font8x8::{BASIC_FONTS, UnicodeFonts};
use image::{DynamicImage, Rgba, RgbaImage};

use crate::constants::{
    WATERMARK_ALPHA, WATERMARK_BOX_HEIGHT, WATERMARK_BOX_WIDTH, WATERMARK_GLYPH_SCALE,
    WATERMARK_TEXT_X, WATERMARK_TEXT_Y,
};

const GLYPH_SIZE: u32 = 8;

/// Overlay `text` in semi-transparent white, anchored to the bottom-right
/// corner.
///
/// The text sits in a fixed 200x50 box. If the image is smaller than the
/// box, or the text runs past its right edge, whatever falls outside is
/// clipped. Characters without a glyph are skipped.
pub fn watermark(img: DynamicImage, text: &str) -> DynamicImage {
    let mut canvas = img.into_rgba8();
    let box_x = canvas.width() as i64 - WATERMARK_BOX_WIDTH as i64;
    let box_y = canvas.height() as i64 - WATERMARK_BOX_HEIGHT as i64;
    let advance = GLYPH_SIZE * WATERMARK_GLYPH_SCALE;

    let mut pen_x = WATERMARK_TEXT_X;
    for glyph in text.chars().filter_map(|c| BASIC_FONTS.get(c)) {
        if pen_x >= WATERMARK_BOX_WIDTH {
            break;
        }
        for (row, bits) in glyph.iter().enumerate() {
            for col in 0..GLYPH_SIZE {
                if bits & (1 << col) == 0 {
                    continue;
                }
                for sy in 0..WATERMARK_GLYPH_SCALE {
                    for sx in 0..WATERMARK_GLYPH_SCALE {
                        let local_x = pen_x + col * WATERMARK_GLYPH_SCALE + sx;
                        let local_y = WATERMARK_TEXT_Y + row as u32 * WATERMARK_GLYPH_SCALE + sy;
                        if local_x >= WATERMARK_BOX_WIDTH || local_y >= WATERMARK_BOX_HEIGHT {
                            continue;
                        }
                        blend_white(
                            &mut canvas,
                            box_x + local_x as i64,
                            box_y + local_y as i64,
                        );
                    }
                }
            }
        }
        pen_x += advance;
    }

    DynamicImage::ImageRgba8(canvas)
}

fn blend_white(canvas: &mut RgbaImage, x: i64, y: i64) {
    if x < 0 || y < 0 || x >= canvas.width() as i64 || y >= canvas.height() as i64 {
        return;
    }
    let alpha = WATERMARK_ALPHA as u32;
    let Rgba([r, g, b, a]) = *canvas.get_pixel(x as u32, y as u32);
    let mix = |c: u8| ((c as u32 * (255 - alpha) + 255 * alpha + 127) / 255) as u8;
    let out_a = a as u32 + ((255 - a as u32) * alpha + 127) / 255;
    canvas.put_pixel(x as u32, y as u32, Rgba([mix(r), mix(g), mix(b), out_a as u8]));
}
