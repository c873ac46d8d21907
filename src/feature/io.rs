//! Convenience helpers for moving between the `image` crate and feature arrays.
//!
//! Available when the `image-io` feature is enabled.

use crate::feature::FeatureArray;
use crate::util::{PatchFlowError, PatchFlowResult};
use std::path::Path;

/// Per-channel mean used to normalize `[0, 1]` RGB input.
pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
/// Per-channel standard deviation used to normalize `[0, 1]` RGB input.
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

fn io_error(err: image::ImageError) -> PatchFlowError {
    PatchFlowError::ImageIo {
        reason: err.to_string(),
    }
}

/// Loads an image from disk as 8-bit RGB.
pub fn load_rgb_image<P: AsRef<Path>>(path: P) -> PatchFlowResult<image::RgbImage> {
    let img = image::open(path).map_err(io_error)?;
    Ok(img.to_rgb8())
}

/// Crops the bottom/right edges so both extents are multiples of `multiple`.
pub fn crop_to_multiple(img: &image::RgbImage, multiple: u32) -> PatchFlowResult<image::RgbImage> {
    let multiple = multiple.max(1);
    let width = img.width() - img.width() % multiple;
    let height = img.height() - img.height() % multiple;
    if width == 0 || height == 0 {
        return Err(PatchFlowError::ShapeError {
            reason: "image is smaller than the coarsest pyramid cell",
        });
    }
    Ok(image::imageops::crop_imm(img, 0, 0, width, height).to_image())
}

/// Converts an RGB image into raw `[0, 255]` pixel channels (3 x H x W).
pub fn pixels_from_rgb(img: &image::RgbImage) -> PatchFlowResult<FeatureArray> {
    let width = img.width() as usize;
    let height = img.height() as usize;
    FeatureArray::from_fn(3, height, width, |c, y, x| {
        img.get_pixel(x as u32, y as u32)[c] as f32
    })
}

/// Converts an RGB image into normalized feature channels (3 x H x W).
///
/// Values are scaled to `[0, 1]` and standardized per channel with
/// [`IMAGENET_MEAN`] and [`IMAGENET_STD`].
pub fn features_from_rgb(img: &image::RgbImage) -> PatchFlowResult<FeatureArray> {
    let width = img.width() as usize;
    let height = img.height() as usize;
    FeatureArray::from_fn(3, height, width, |c, y, x| {
        let v = img.get_pixel(x as u32, y as u32)[c] as f32 / 255.0;
        (v - IMAGENET_MEAN[c]) / IMAGENET_STD[c]
    })
}

/// Converts 3-channel `[0, 255]` pixel data back into an RGB image.
///
/// Values are clamped and rounded.
pub fn rgb_from_pixels(pixels: &FeatureArray) -> PatchFlowResult<image::RgbImage> {
    if pixels.channels() != 3 {
        return Err(PatchFlowError::ShapeError {
            reason: "RGB output needs exactly three channels",
        });
    }
    let width = u32::try_from(pixels.width()).map_err(|_| PatchFlowError::ShapeError {
        reason: "image width exceeds u32",
    })?;
    let height = u32::try_from(pixels.height()).map_err(|_| PatchFlowError::ShapeError {
        reason: "image height exceeds u32",
    })?;

    let plane = pixels.height() * pixels.width();
    let data = pixels.as_slice();
    let mut out = image::RgbImage::new(width, height);
    for (idx, px) in out.pixels_mut().enumerate() {
        for c in 0..3 {
            px[c] = data[c * plane + idx].clamp(0.0, 255.0).round() as u8;
        }
    }
    Ok(out)
}

/// Writes 3-channel `[0, 255]` pixel data to disk; format follows the extension.
pub fn save_rgb_pixels<P: AsRef<Path>>(pixels: &FeatureArray, path: P) -> PatchFlowResult<()> {
    rgb_from_pixels(pixels)?.save(path).map_err(io_error)
}
