/// Default encoder quality (1-100).
pub const DEFAULT_QUALITY: u8 = 80;

/// Largest pixel count any intermediate image may reach.
pub const MAX_PIXELS: u64 = 100_000_000;

/// AVIF encoder speed (1 slowest .. 10 fastest).
pub const AVIF_SPEED: u8 = 6;

/// Watermark overlay box, anchored to the bottom-right corner.
pub const WATERMARK_BOX_WIDTH: u32 = 200;
pub const WATERMARK_BOX_HEIGHT: u32 = 50;
/// Top-left of the first glyph, relative to the overlay box.
pub const WATERMARK_TEXT_X: u32 = 10;
pub const WATERMARK_TEXT_Y: u32 = 14;
/// 8x8 glyphs drawn at this integer scale.
pub const WATERMARK_GLYPH_SCALE: u32 = 2;
/// Text opacity as a fraction of 255.
pub const WATERMARK_ALPHA: u8 = 128;
