//! Level pyramids, one per image.

use crate::feature::FeatureArray;
use crate::field::CorrespondenceField;
use crate::flow::config::FlowConfig;
use crate::level::Level;
use crate::trace::{trace_event, trace_span};
use crate::util::{PatchFlowError, PatchFlowResult};

/// Ordered levels for one image, coarse to fine.
#[derive(Clone, Debug)]
pub struct Pyramid {
    levels: Vec<Level>,
}

impl Pyramid {
    /// Returns the number of depths.
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Always false; a pyramid holds at least one level.
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Returns all levels, coarse to fine.
    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    /// Returns the level at `depth`.
    pub fn level(&self, depth: usize) -> Option<&Level> {
        self.levels.get(depth)
    }

    /// Returns the finest level.
    pub fn finest(&self) -> &Level {
        &self.levels[self.levels.len() - 1]
    }

    /// Returns the field of the finest level.
    pub fn finest_field(&self) -> &CorrespondenceField {
        self.finest().field()
    }

    /// Consumes the pyramid and returns its levels.
    pub fn into_levels(self) -> Vec<Level> {
        self.levels
    }

    pub(crate) fn levels_mut(&mut self) -> &mut [Level] {
        &mut self.levels
    }
}

/// Builds one level per feature array, coarse to fine.
///
/// Each level takes its parameters from [`FlowConfig::level`] (the schedule is
/// aligned at its fine end),
/// starts at identity correspondence with zero scores, and derives its blend
/// weights from its own feature norms.
pub fn build_pyramid(features: Vec<FeatureArray>, config: &FlowConfig) -> PatchFlowResult<Pyramid> {
    if features.is_empty() {
        return Err(PatchFlowError::ShapeError {
            reason: "pyramid needs at least one feature array",
        });
    }
    if features.len() > config.levels.len() {
        return Err(PatchFlowError::ShapeError {
            reason: "level schedule is shorter than the feature sequence",
        });
    }

    let _span = trace_span!("build_pyramid", depths = features.len()).entered();

    let depths = features.len();
    let mut levels = Vec::with_capacity(depths);
    for (depth, array) in features.into_iter().enumerate() {
        let params = config.level(depth, depths)?;
        let level = Level::new(depth, array, params)?;
        trace_event!(
            "level_built",
            depth = depth,
            height = level.height(),
            width = level.width(),
            channels = level.features().channels(),
            padding = params.padding,
        );
        levels.push(level);
    }

    Ok(Pyramid { levels })
}
