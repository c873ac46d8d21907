//! Feature arrays and feature-sequence extraction.
//!
//! A [`FeatureArray`] is an owned `f32` buffer laid out channels × height ×
//! width, row-major within each channel. It is the unit handed over by a
//! feature extractor for one pyramid level of one image and is never mutated
//! after construction.

use crate::util::math::l2_norm;
use crate::util::{PatchFlowError, PatchFlowResult};

#[cfg(feature = "image-io")]
pub mod io;
pub mod pyramid;

/// Owned CHW feature array.
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureArray {
    data: Vec<f32>,
    channels: usize,
    height: usize,
    width: usize,
}

impl FeatureArray {
    /// Wraps a CHW buffer.
    ///
    /// Fails with `ShapeError` when any extent is zero or the buffer length is
    /// not exactly `channels * height * width`.
    pub fn new(
        data: Vec<f32>,
        channels: usize,
        height: usize,
        width: usize,
    ) -> PatchFlowResult<Self> {
        if channels == 0 {
            return Err(PatchFlowError::ShapeError {
                reason: "feature array needs at least one channel",
            });
        }
        if height == 0 || width == 0 {
            return Err(PatchFlowError::ShapeError {
                reason: "feature array needs at least 1x1 spatial cells",
            });
        }
        let needed = channels
            .checked_mul(height)
            .and_then(|v| v.checked_mul(width))
            .ok_or(PatchFlowError::ShapeError {
                reason: "feature array extent overflows",
            })?;
        if data.len() != needed {
            return Err(PatchFlowError::ShapeError {
                reason: "feature buffer length does not match channels*height*width",
            });
        }
        Ok(Self {
            data,
            channels,
            height,
            width,
        })
    }

    /// Builds an array by evaluating `f(channel, y, x)` for every element.
    pub fn from_fn<F>(channels: usize, height: usize, width: usize, mut f: F) -> PatchFlowResult<Self>
    where
        F: FnMut(usize, usize, usize) -> f32,
    {
        let mut data = Vec::with_capacity(channels.saturating_mul(height).saturating_mul(width));
        for c in 0..channels {
            for y in 0..height {
                for x in 0..width {
                    data.push(f(c, y, x));
                }
            }
        }
        Self::new(data, channels, height, width)
    }

    /// Returns the number of channels.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Returns the spatial height in cells.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the spatial width in cells.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the raw CHW buffer.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Returns one channel plane (`height * width` values, row-major).
    pub fn plane(&self, channel: usize) -> Option<&[f32]> {
        if channel >= self.channels {
            return None;
        }
        let len = self.height * self.width;
        let start = channel * len;
        self.data.get(start..start + len)
    }

    /// Returns the value at `(channel, y, x)` if in bounds.
    pub fn get(&self, channel: usize, y: usize, x: usize) -> Option<f32> {
        if channel >= self.channels || y >= self.height || x >= self.width {
            return None;
        }
        self.data
            .get((channel * self.height + y) * self.width + x)
            .copied()
    }

    /// Copies the channel vector at `(y, x)` into `out`.
    ///
    /// `out` must hold exactly `channels` values and `(y, x)` must be in bounds.
    pub(crate) fn read_cell(&self, y: usize, x: usize, out: &mut [f32]) {
        debug_assert_eq!(out.len(), self.channels);
        let plane = self.height * self.width;
        let offset = y * self.width + x;
        for (c, slot) in out.iter_mut().enumerate() {
            *slot = self.data[c * plane + offset];
        }
    }

    /// Euclidean norm across channels for every cell, row-major.
    pub fn cell_norms(&self) -> Vec<f32> {
        let mut cell = vec![0.0f32; self.channels];
        let mut norms = Vec::with_capacity(self.height * self.width);
        for y in 0..self.height {
            for x in 0..self.width {
                self.read_cell(y, x, &mut cell);
                norms.push(l2_norm(&cell));
            }
        }
        norms
    }
}

#[cfg(test)]
mod tests {
    use super::FeatureArray;
    use crate::PatchFlowError;

    #[test]
    fn rejects_empty_extents() {
        let err = FeatureArray::new(Vec::new(), 1, 0, 3).unwrap_err();
        assert!(matches!(err, PatchFlowError::ShapeError { .. }));
        let err = FeatureArray::new(Vec::new(), 0, 1, 1).unwrap_err();
        assert!(matches!(err, PatchFlowError::ShapeError { .. }));
    }

    #[test]
    fn rejects_wrong_buffer_length() {
        let err = FeatureArray::new(vec![0.0; 5], 1, 2, 2).unwrap_err();
        assert!(matches!(err, PatchFlowError::ShapeError { .. }));
    }

    #[test]
    fn indexes_channel_major() {
        let arr = FeatureArray::from_fn(2, 2, 3, |c, y, x| (c * 100 + y * 10 + x) as f32).unwrap();
        assert_eq!(arr.get(1, 1, 2), Some(112.0));
        assert_eq!(arr.plane(1).unwrap()[0], 100.0);
        assert_eq!(arr.get(2, 0, 0), None);

        let mut cell = [0.0f32; 2];
        arr.read_cell(1, 0, &mut cell);
        assert_eq!(cell, [10.0, 110.0]);
    }

    #[test]
    fn cell_norms_span_channels() {
        let arr = FeatureArray::new(vec![3.0, 0.0, 4.0, 0.0], 2, 1, 2).unwrap();
        let norms = arr.cell_norms();
        assert!((norms[0] - 5.0).abs() < 1e-6);
        assert_eq!(norms[1], 0.0);
    }
}
