//! Feature sequences and the built-in box pyramid extractor.
//!
//! Extractors may emit their levels in either order; the correspondence
//! pipeline always consumes them coarse to fine, so a [`FeatureStack`]
//! records the order it was produced in and normalizes on demand.
//!
//! [`BoxPyramidExtractor`] downsamples with a 2x2 box filter,
//! `dst = (a + b + c + d) / 4` per channel, and emits fine to coarse like a
//! convolutional backbone would.

use crate::feature::FeatureArray;
use crate::util::{PatchFlowError, PatchFlowResult};

/// Order of the arrays inside a [`FeatureStack`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LevelOrder {
    /// Smallest spatial resolution first.
    CoarseToFine,
    /// Largest spatial resolution first.
    FineToCoarse,
}

/// Ordered sequence of feature arrays for one image.
#[derive(Clone, Debug)]
pub struct FeatureStack {
    arrays: Vec<FeatureArray>,
    order: LevelOrder,
}

impl FeatureStack {
    /// Wraps a non-empty sequence produced in `order`.
    pub fn new(arrays: Vec<FeatureArray>, order: LevelOrder) -> PatchFlowResult<Self> {
        if arrays.is_empty() {
            return Err(PatchFlowError::ShapeError {
                reason: "feature stack needs at least one level",
            });
        }
        Ok(Self { arrays, order })
    }

    /// Returns the order the arrays are currently stored in.
    pub fn order(&self) -> LevelOrder {
        self.order
    }

    /// Returns the number of levels.
    pub fn len(&self) -> usize {
        self.arrays.len()
    }

    /// Always false; a stack holds at least one level.
    pub fn is_empty(&self) -> bool {
        self.arrays.is_empty()
    }

    /// Returns the arrays in stored order.
    pub fn arrays(&self) -> &[FeatureArray] {
        &self.arrays
    }

    /// Consumes the stack and returns its arrays coarse to fine.
    pub fn into_coarse_to_fine(self) -> Vec<FeatureArray> {
        let mut arrays = self.arrays;
        if self.order == LevelOrder::FineToCoarse {
            arrays.reverse();
        }
        arrays
    }
}

/// Produces a multi-level feature sequence for an image.
///
/// The image is handed over as a CHW [`FeatureArray`] of pixel values; a
/// neural backbone would run its convolution stack here.
pub trait FeatureExtractor {
    /// Extracts the feature levels for one image.
    fn extract(&self, image: &FeatureArray) -> PatchFlowResult<FeatureStack>;
}

/// Box-filter pyramid over raw pixel channels.
#[derive(Clone, Copy, Debug)]
pub struct BoxPyramidExtractor {
    /// Number of levels to produce, including the base resolution.
    pub levels: usize,
}

impl Default for BoxPyramidExtractor {
    fn default() -> Self {
        Self { levels: 3 }
    }
}

impl FeatureExtractor for BoxPyramidExtractor {
    fn extract(&self, image: &FeatureArray) -> PatchFlowResult<FeatureStack> {
        let levels = self.levels.max(1);
        let factor = 1usize
            .checked_shl((levels - 1) as u32)
            .ok_or(PatchFlowError::InvalidConfig {
                reason: "too many pyramid levels",
            })?;
        if image.height() % factor != 0 || image.width() % factor != 0 {
            return Err(PatchFlowError::ShapeError {
                reason: "image size must be divisible by 2^(levels-1)",
            });
        }

        let mut arrays = Vec::with_capacity(levels);
        arrays.push(image.clone());
        while arrays.len() < levels {
            let prev = arrays.last().ok_or(PatchFlowError::IndexOutOfBounds {
                index: 0,
                len: 0,
                context: "pyramid level",
            })?;
            let next = downsample_box(prev)?;
            arrays.push(next);
        }

        FeatureStack::new(arrays, LevelOrder::FineToCoarse)
    }
}

/// Halves both spatial extents with a 2x2 box filter per channel.
///
/// A trailing odd row or column is dropped.
pub fn downsample_box(src: &FeatureArray) -> PatchFlowResult<FeatureArray> {
    let dst_height = src.height() / 2;
    let dst_width = src.width() / 2;
    if dst_height == 0 || dst_width == 0 {
        return Err(PatchFlowError::ShapeError {
            reason: "cannot downsample below 1x1",
        });
    }

    let src_width = src.width();
    let mut data = Vec::with_capacity(src.channels() * dst_height * dst_width);
    for c in 0..src.channels() {
        let plane = src.plane(c).ok_or(PatchFlowError::IndexOutOfBounds {
            index: c,
            len: src.channels(),
            context: "channel",
        })?;
        for y in 0..dst_height {
            let row0 = &plane[(2 * y) * src_width..(2 * y + 1) * src_width];
            let row1 = &plane[(2 * y + 1) * src_width..(2 * y + 2) * src_width];
            for x in 0..dst_width {
                let sum = row0[2 * x] + row0[2 * x + 1] + row1[2 * x] + row1[2 * x + 1];
                data.push(sum * 0.25);
            }
        }
    }

    FeatureArray::new(data, src.channels(), dst_height, dst_width)
}
