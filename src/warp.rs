//! Rebuilding one image from another through a correspondence field.
//!
//! A field at a coarse depth still addresses full-resolution pixels: with
//! `zoom = image / field` along each axis, output pixel `(y, x)` copies
//! source pixel `(v * zoom + y % zoom, u * zoom + x % zoom)` where `(v, u)`
//! is the match of cell `(y / zoom, x / zoom)`. Each cell therefore pastes a
//! whole `zoom x zoom` block from the opposing image.

use crate::feature::FeatureArray;
use crate::field::CorrespondenceField;
use crate::util::{PatchFlowError, PatchFlowResult};

/// Warps `source` (the opposing image) onto an `out_height x out_width` grid.
///
/// `out_*` must be a whole multiple of the field size, and `source` must be
/// the same multiple of the field's target grid.
pub fn warp_features(
    field: &CorrespondenceField,
    source: &FeatureArray,
    out_height: usize,
    out_width: usize,
) -> PatchFlowResult<FeatureArray> {
    let zoom_y = out_height / field.height();
    let zoom_x = out_width / field.width();
    if zoom_y == 0
        || zoom_x == 0
        || zoom_y * field.height() != out_height
        || zoom_x * field.width() != out_width
    {
        return Err(PatchFlowError::ShapeError {
            reason: "output size must be a whole multiple of the field size",
        });
    }
    if source.height() != field.target_height() * zoom_y
        || source.width() != field.target_width() * zoom_x
    {
        return Err(PatchFlowError::ShapeError {
            reason: "source size must match the field target grid at the same zoom",
        });
    }

    let channels = source.channels();
    let src = source.as_slice();
    let src_plane = source.height() * source.width();
    let mut data = vec![0.0f32; channels * out_height * out_width];
    let out_plane = out_height * out_width;
    for y in 0..out_height {
        for x in 0..out_width {
            let (c, _) = field.entry(y / zoom_y, x / zoom_x);
            let sy = c.row * zoom_y + y % zoom_y;
            let sx = c.col * zoom_x + x % zoom_x;
            let src_idx = sy * source.width() + sx;
            let dst_idx = y * out_width + x;
            for ch in 0..channels {
                data[ch * out_plane + dst_idx] = src[ch * src_plane + src_idx];
            }
        }
    }

    FeatureArray::new(data, channels, out_height, out_width)
}
