//! Dense correspondence fields.
//!
//! A field stores, for every cell of one image's level, the best-known match
//! coordinate in the opposing image's same-depth grid and the similarity of
//! that match. Both arrays are row-major; coordinates are `(row, col)` pairs.

use crate::util::{PatchFlowError, PatchFlowResult};

/// Cell coordinate as `(row, col)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Coord {
    /// Row (y) in cells.
    pub row: usize,
    /// Column (x) in cells.
    pub col: usize,
}

impl Coord {
    /// Creates a coordinate from `(row, col)`.
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Clamps the coordinate into a `height x width` grid.
    pub fn clamp_to(self, height: usize, width: usize) -> Self {
        Self {
            row: self.row.min(height.saturating_sub(1)),
            col: self.col.min(width.saturating_sub(1)),
        }
    }
}

/// Per-cell match indices and scores for one level.
#[derive(Clone, Debug, PartialEq)]
pub struct CorrespondenceField {
    height: usize,
    width: usize,
    target_height: usize,
    target_width: usize,
    indices: Vec<Coord>,
    scores: Vec<f32>,
}

impl CorrespondenceField {
    /// Creates an identity field (cell `(y, x)` matches `(y, x)`) with zero scores.
    ///
    /// The target grid starts out equal to the field's own grid; see
    /// [`CorrespondenceField::bind_target`].
    pub fn identity(height: usize, width: usize) -> PatchFlowResult<Self> {
        if height == 0 || width == 0 {
            return Err(PatchFlowError::ShapeError {
                reason: "correspondence field needs at least 1x1 cells",
            });
        }
        let mut indices = Vec::with_capacity(height * width);
        for y in 0..height {
            for x in 0..width {
                indices.push(Coord::new(y, x));
            }
        }
        Ok(Self {
            height,
            width,
            target_height: height,
            target_width: width,
            indices,
            scores: vec![0.0; height * width],
        })
    }

    /// Creates a field from explicit indices with zero scores.
    ///
    /// Every index must lie inside `target_height x target_width`.
    pub fn from_indices(
        height: usize,
        width: usize,
        target_height: usize,
        target_width: usize,
        indices: Vec<Coord>,
    ) -> PatchFlowResult<Self> {
        if height == 0 || width == 0 || target_height == 0 || target_width == 0 {
            return Err(PatchFlowError::ShapeError {
                reason: "correspondence field needs at least 1x1 cells",
            });
        }
        if indices.len() != height * width {
            return Err(PatchFlowError::ShapeError {
                reason: "index count does not match field size",
            });
        }
        if let Some(pos) = indices
            .iter()
            .position(|c| c.row >= target_height || c.col >= target_width)
        {
            return Err(PatchFlowError::IndexOutOfBounds {
                index: pos,
                len: indices.len(),
                context: "field index outside target grid",
            });
        }
        Ok(Self {
            height,
            width,
            target_height,
            target_width,
            indices,
            scores: vec![0.0; height * width],
        })
    }

    /// Points the field at an opposing grid of `height x width`, clamping
    /// every index into it.
    pub fn bind_target(&mut self, height: usize, width: usize) -> PatchFlowResult<()> {
        if height == 0 || width == 0 {
            return Err(PatchFlowError::ShapeError {
                reason: "target grid needs at least 1x1 cells",
            });
        }
        self.target_height = height;
        self.target_width = width;
        for c in self.indices.iter_mut() {
            *c = c.clamp_to(height, width);
        }
        Ok(())
    }

    /// Returns the field height in cells.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the field width in cells.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the opposing grid height.
    pub fn target_height(&self) -> usize {
        self.target_height
    }

    /// Returns the opposing grid width.
    pub fn target_width(&self) -> usize {
        self.target_width
    }

    /// Returns the match of cell `(y, x)`.
    pub fn index(&self, y: usize, x: usize) -> Option<Coord> {
        if y >= self.height || x >= self.width {
            return None;
        }
        Some(self.indices[y * self.width + x])
    }

    /// Returns the score of cell `(y, x)`.
    pub fn score(&self, y: usize, x: usize) -> Option<f32> {
        if y >= self.height || x >= self.width {
            return None;
        }
        Some(self.scores[y * self.width + x])
    }

    /// Returns all matches, row-major.
    pub fn indices(&self) -> &[Coord] {
        &self.indices
    }

    /// Returns all scores, row-major.
    pub fn scores(&self) -> &[f32] {
        &self.scores
    }

    /// Returns matches flattened as `[row0, col0, row1, col1, ...]`.
    pub fn indices_flat(&self) -> Vec<usize> {
        let mut out = Vec::with_capacity(self.indices.len() * 2);
        for c in &self.indices {
            out.push(c.row);
            out.push(c.col);
        }
        out
    }

    /// Mean score over all cells.
    pub fn mean_score(&self) -> f32 {
        let sum: f64 = self.scores.iter().map(|&s| s as f64).sum();
        (sum / self.scores.len() as f64) as f32
    }

    /// Counts cells whose match equals their own coordinate.
    pub fn identity_count(&self) -> usize {
        self.indices
            .iter()
            .enumerate()
            .filter(|(i, c)| c.row == i / self.width && c.col == i % self.width)
            .count()
    }

    /// Nearest-neighbour 2x upsampling of the indices with doubled magnitude.
    ///
    /// Child cell `(y, x)` receives `2 * self[y / 2, x / 2]`. The result is
    /// row-major over a `2h x 2w` grid and is not clamped.
    pub fn upsample_indices(&self) -> (usize, usize, Vec<Coord>) {
        let up_height = self.height * 2;
        let up_width = self.width * 2;
        let mut out = Vec::with_capacity(up_height * up_width);
        for y in 0..up_height {
            let row = &self.indices[(y / 2) * self.width..(y / 2 + 1) * self.width];
            for x in 0..up_width {
                let c = row[x / 2];
                out.push(Coord::new(c.row * 2, c.col * 2));
            }
        }
        (up_height, up_width, out)
    }

    /// Replaces every index, clamping into the target grid. Scores are kept.
    pub(crate) fn reseed(&mut self, indices: Vec<Coord>) {
        debug_assert_eq!(indices.len(), self.indices.len());
        let (th, tw) = (self.target_height, self.target_width);
        self.indices = indices.into_iter().map(|c| c.clamp_to(th, tw)).collect();
    }

    #[inline]
    pub(crate) fn entry(&self, y: usize, x: usize) -> (Coord, f32) {
        let idx = y * self.width + x;
        (self.indices[idx], self.scores[idx])
    }

    #[inline]
    pub(crate) fn set(&mut self, y: usize, x: usize, coord: Coord, score: f32) {
        let idx = y * self.width + x;
        self.indices[idx] = coord;
        self.scores[idx] = score;
    }

    /// Splits the field into per-row `(indices, scores)` slices.
    pub(crate) fn rows_mut(&mut self) -> impl Iterator<Item = (&mut [Coord], &mut [f32])> + '_ {
        let width = self.width;
        self.indices
            .chunks_mut(width)
            .zip(self.scores.chunks_mut(width))
    }

    #[cfg(feature = "rayon")]
    pub(crate) fn parts_mut(&mut self) -> (&mut [Coord], &mut [f32]) {
        (&mut self.indices, &mut self.scores)
    }
}

#[cfg(test)]
mod tests {
    use super::{Coord, CorrespondenceField};
    use crate::PatchFlowError;

    #[test]
    fn identity_maps_cells_to_themselves() {
        let field = CorrespondenceField::identity(3, 4).unwrap();
        assert_eq!(field.index(2, 1), Some(Coord::new(2, 1)));
        assert_eq!(field.identity_count(), 12);
        assert!(field.scores().iter().all(|&s| s == 0.0));
        assert_eq!(&field.indices_flat()[..4], &[0, 0, 0, 1]);
    }

    #[test]
    fn bind_target_clamps_indices() {
        let mut field = CorrespondenceField::identity(4, 4).unwrap();
        field.bind_target(2, 3).unwrap();
        assert_eq!(field.index(3, 3), Some(Coord::new(1, 2)));
        assert_eq!(field.target_height(), 2);
    }

    #[test]
    fn from_indices_rejects_out_of_bounds() {
        let err = CorrespondenceField::from_indices(1, 2, 1, 1, vec![Coord::new(0, 0), Coord::new(0, 1)])
            .unwrap_err();
        assert!(matches!(err, PatchFlowError::IndexOutOfBounds { index: 1, .. }));
    }

    #[test]
    fn upsample_duplicates_and_doubles() {
        let field = CorrespondenceField::from_indices(
            1,
            2,
            1,
            2,
            vec![Coord::new(0, 1), Coord::new(0, 0)],
        )
        .unwrap();
        let (h, w, up) = field.upsample_indices();
        assert_eq!((h, w), (2, 4));
        assert_eq!(up[0], Coord::new(0, 2));
        assert_eq!(up[1], Coord::new(0, 2));
        assert_eq!(up[2], Coord::new(0, 0));
        assert_eq!(up[7], Coord::new(0, 0));
    }
}
