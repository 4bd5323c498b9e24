//! Pure region cropping logic: functional core.
//!
//! This module has zero infrastructure dependencies.
//! It takes pixel data in, returns pixel data out.

use crate::bounds::PixelRegion;
use image::{imageops, RgbaImage};

/// Copies `region` out of a full-display capture.
///
/// The region must already be clipped to the image; see
/// [`CaptureBounds::to_pixels`](crate::bounds::CaptureBounds::to_pixels).
pub fn crop_region(image: &RgbaImage, region: PixelRegion) -> Result<RgbaImage, CropError> {
    if region.width == 0 || region.height == 0 {
        return Err(CropError::ZeroDimension);
    }

    let (img_width, img_height) = image.dimensions();

    let fits_x = region.x.checked_add(region.width).is_some_and(|r| r <= img_width);
    let fits_y = region.y.checked_add(region.height).is_some_and(|b| b <= img_height);
    if !fits_x || !fits_y {
        return Err(CropError::OutOfBounds {
            requested: region,
            image_size: (img_width, img_height),
        });
    }

    Ok(imageops::crop_imm(image, region.x, region.y, region.width, region.height).to_image())
}

#[derive(Debug, thiserror::Error)]
pub enum CropError {
    #[error("Crop rectangle has zero width or height")]
    ZeroDimension,

    #[error(
        "Crop rectangle ({},{},{},{}) exceeds image bounds ({}x{})",
        requested.x, requested.y, requested.width, requested.height,
        image_size.0, image_size.1
    )]
    OutOfBounds {
        requested: PixelRegion,
        image_size: (u32, u32),
    },
}
