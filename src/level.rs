//! Per-depth correspondence state for one image.
//!
//! A [`Level`] owns everything one pyramid resolution needs: the feature
//! array, its original and reproduction patch banks, the correspondence
//! field into the opposing image, and the per-cell blend weights.

use crate::bank::PatchBank;
use crate::feature::FeatureArray;
use crate::field::CorrespondenceField;
use crate::util::math::{mean_std, squash_weight};
use crate::util::PatchFlowResult;

/// Scalar parameters for one pyramid depth.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LevelParams {
    /// Upper bound of the per-cell blend weight (own vs. warped features).
    pub weight: f32,
    /// Random-search radius in cells; `<= 0` searches the whole opposing grid.
    pub radius: i32,
    /// Patch half-size; descriptors cover `(2p+1) x (2p+1)` cells.
    pub padding: usize,
}

/// Original and reproduction descriptors of one level.
#[derive(Clone, Debug)]
pub struct LevelPatches {
    pub(crate) orign: PatchBank,
    pub(crate) repro: PatchBank,
}

impl LevelPatches {
    /// Descriptors of the level's own features.
    pub fn orign(&self) -> &PatchBank {
        &self.orign
    }

    /// Descriptors of the blended (reproduction) features.
    pub fn repro(&self) -> &PatchBank {
        &self.repro
    }
}

/// Correspondence state for one image at one depth.
#[derive(Clone, Debug)]
pub struct Level {
    depth: usize,
    params: LevelParams,
    features: FeatureArray,
    pub(crate) patches: LevelPatches,
    pub(crate) field: CorrespondenceField,
    weights: Vec<f32>,
}

impl Level {
    /// Builds a level with identity correspondence and zero scores.
    ///
    /// The reproduction bank starts as a copy of the original bank.
    pub fn new(depth: usize, features: FeatureArray, params: LevelParams) -> PatchFlowResult<Self> {
        let orign = PatchBank::extract(&features, params.padding)?;
        let repro = orign.clone();
        let field = CorrespondenceField::identity(features.height(), features.width())?;
        let weights = cell_weights(&features, params.weight);
        Ok(Self {
            depth,
            params,
            features,
            patches: LevelPatches { orign, repro },
            field,
            weights,
        })
    }

    /// Returns the pyramid depth (0 is the coarsest level).
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Returns the level parameters.
    pub fn params(&self) -> LevelParams {
        self.params
    }

    /// Returns the level's own feature array.
    pub fn features(&self) -> &FeatureArray {
        &self.features
    }

    /// Returns the level's patch banks.
    pub fn patches(&self) -> &LevelPatches {
        &self.patches
    }

    /// Returns the correspondence field into the opposing image.
    pub fn field(&self) -> &CorrespondenceField {
        &self.field
    }

    /// Returns the per-cell blend weights, row-major.
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    /// Returns the spatial height in cells.
    pub fn height(&self) -> usize {
        self.features.height()
    }

    /// Returns the spatial width in cells.
    pub fn width(&self) -> usize {
        self.features.width()
    }

    /// Points this level's field at `opposing`'s grid, clamping indices into it.
    pub fn bind_opposing(&mut self, opposing: &Level) -> PatchFlowResult<()> {
        self.field.bind_target(opposing.height(), opposing.width())
    }

    /// Consumes the level and returns its field.
    pub fn into_field(self) -> CorrespondenceField {
        self.field
    }

    pub(crate) fn set_repro(&mut self, repro: PatchBank) {
        self.patches.repro = repro;
    }
}

/// Logistic weight of each cell's z-scored feature norm.
///
/// A level whose norms have zero spread treats every cell as `z = 0`.
fn cell_weights(features: &FeatureArray, weight: f32) -> Vec<f32> {
    let norms = features.cell_norms();
    let (mean, std) = mean_std(&norms);
    norms
        .iter()
        .map(|&n| {
            let z = if std > 0.0 { (n - mean) / std } else { 0.0 };
            squash_weight(weight, z)
        })
        .collect()
}
