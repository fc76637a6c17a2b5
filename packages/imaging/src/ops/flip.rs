use image::DynamicImage;

use crate::params::FlipAxis;

/// Mirror `img`. Horizontal swaps left and right, vertical swaps top and bottom.
pub fn flip(img: DynamicImage, axis: FlipAxis) -> DynamicImage {
    match axis {
        FlipAxis::Horizontal => img.fliph(),
        FlipAxis::Vertical => img.flipv(),
        FlipAxis::Both => img.fliph().flipv(),
    }
}
