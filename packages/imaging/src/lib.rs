//! Decode, transform and re-encode raster images.
//!
//! A [`TransformRequest`] always runs in the same order: crop, resize,
//! rotate, flip, watermark, encode. Steps whose parameters are absent are
//! skipped; they are never reordered.

pub mod constants;
mod decode;
pub mod dimensions;
mod encode;
mod engine;
mod error;
pub mod ops;
mod params;

pub use constants::{DEFAULT_QUALITY, MAX_PIXELS};
pub use engine::{ImageInfo, TransformOutput, probe, transform};
pub use error::ImageError;
pub use params::{
    CropRect, FitPolicy, FlipAxis, OutputFormat, ResizeSpec, TransformRequest, TransformStep,
};
