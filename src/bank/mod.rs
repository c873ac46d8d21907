//! Precomputed patch descriptors for one feature array.
//!
//! Each spatial cell owns one descriptor: the `(2p+1) x (2p+1)` window of
//! channel vectors centred on it, with edge-replicated borders, flattened in
//! `(dy, dx, channel)` order and divided by its Euclidean norm. Scoring two
//! cells then reduces to a dot product of unit vectors (a cosine similarity).

use crate::feature::FeatureArray;
use crate::trace::trace_event;
use crate::util::math::{clamp_offset, l2_norm};
use crate::util::{PatchFlowError, PatchFlowResult};

/// Unit-normalized patch descriptors, one per cell of a feature array.
#[derive(Clone, Debug)]
pub struct PatchBank {
    height: usize,
    width: usize,
    padding: usize,
    dim: usize,
    data: Vec<f32>,
    degenerate: usize,
}

impl PatchBank {
    /// Extracts and normalizes descriptors with edge-replication padding.
    ///
    /// Zero-norm descriptors are kept as zero vectors and counted in
    /// [`PatchBank::degenerate_count`]; they score 0 against everything.
    pub fn extract(array: &FeatureArray, padding: usize) -> PatchFlowResult<Self> {
        let height = array.height();
        let width = array.width();
        let channels = array.channels();
        if height == 0 || width == 0 {
            return Err(PatchFlowError::ShapeError {
                reason: "patch extraction needs at least 1x1 spatial cells",
            });
        }

        let side = padding
            .checked_mul(2)
            .and_then(|v| v.checked_add(1))
            .ok_or(PatchFlowError::ShapeError {
                reason: "patch padding overflows",
            })?;
        let dim = side
            .checked_mul(side)
            .and_then(|v| v.checked_mul(channels))
            .ok_or(PatchFlowError::ShapeError {
                reason: "patch descriptor size overflows",
            })?;
        let total = dim
            .checked_mul(height * width)
            .ok_or(PatchFlowError::ShapeError {
                reason: "patch bank size overflows",
            })?;

        let pad = padding as isize;
        let mut cell = vec![0.0f32; channels];
        let mut data = Vec::with_capacity(total);
        let mut degenerate = 0usize;
        for y in 0..height {
            for x in 0..width {
                let start = data.len();
                for dy in -pad..=pad {
                    let sy = clamp_offset(y, dy, height);
                    for dx in -pad..=pad {
                        let sx = clamp_offset(x, dx, width);
                        array.read_cell(sy, sx, &mut cell);
                        data.extend_from_slice(&cell);
                    }
                }
                let desc = &mut data[start..];
                let norm = l2_norm(desc);
                if norm > 0.0 {
                    let inv = 1.0 / norm;
                    desc.iter_mut().for_each(|v| *v *= inv);
                } else {
                    degenerate += 1;
                }
            }
        }

        if degenerate > 0 {
            trace_event!("degenerate_descriptors", count = degenerate, height = height, width = width);
        }

        Ok(Self {
            height,
            width,
            padding,
            dim,
            data,
            degenerate,
        })
    }

    /// Returns the bank height in cells.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the bank width in cells.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the number of descriptors (one per cell).
    pub fn len(&self) -> usize {
        self.height * self.width
    }

    /// Always false; extraction rejects empty arrays.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the padding the descriptors were extracted with.
    pub fn padding(&self) -> usize {
        self.padding
    }

    /// Returns the descriptor length, `(2p+1)^2 * channels`.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Returns how many descriptors had zero norm.
    pub fn degenerate_count(&self) -> usize {
        self.degenerate
    }

    /// Returns all descriptors, row-major by cell.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Returns the descriptor of cell `(y, x)` if it is within bounds.
    pub fn descriptor(&self, y: usize, x: usize) -> Option<&[f32]> {
        if y >= self.height || x >= self.width {
            return None;
        }
        Some(self.at(y, x))
    }

    #[inline]
    pub(crate) fn at(&self, y: usize, x: usize) -> &[f32] {
        let start = (y * self.width + x) * self.dim;
        &self.data[start..start + self.dim]
    }
}

#[cfg(test)]
mod tests {
    use super::PatchBank;
    use crate::FeatureArray;

    #[test]
    fn replicates_edges() {
        let arr = FeatureArray::new(vec![1.0, 2.0, 3.0, 4.0], 1, 2, 2).unwrap();
        let bank = PatchBank::extract(&arr, 1).unwrap();
        assert_eq!(bank.dim(), 9);

        // Top-left window over the replicated border is [1,1,2,1,1,2,3,3,4].
        let raw = [1.0f32, 1.0, 2.0, 1.0, 1.0, 2.0, 3.0, 3.0, 4.0];
        let norm = raw.iter().map(|v| v * v).sum::<f32>().sqrt();
        let desc = bank.descriptor(0, 0).unwrap();
        for (got, want) in desc.iter().zip(raw.iter()) {
            assert!((got - want / norm).abs() < 1e-6);
        }
    }

    #[test]
    fn zero_cells_stay_zero() {
        let arr = FeatureArray::new(vec![0.0, 5.0], 1, 1, 2).unwrap();
        let bank = PatchBank::extract(&arr, 0).unwrap();
        assert_eq!(bank.degenerate_count(), 1);
        assert_eq!(bank.descriptor(0, 0).unwrap(), &[0.0]);
        assert_eq!(bank.descriptor(0, 1).unwrap(), &[1.0]);
        assert!(bank.descriptor(1, 0).is_none());
    }
}
