//! Coarse-to-fine bidirectional analogy.
//!
//! Both images are processed depth by depth in lockstep. Each depth goes
//! through two phases: a [`DepthPair`] is merged (both children seeded from
//! their parents and reproduction descriptors rebuilt), which yields a
//! [`MergedDepth`] that alone can be refined. Refinement runs the first
//! image's field, then the second's. Every depth depends on the previous
//! depth's converged fields, so depths are strictly sequential.

pub mod config;
pub(crate) mod reproduce;
pub(crate) mod pyramid;
pub(crate) mod refine;

pub use config::{search_repeats, FlowConfig};
pub use reproduce::merge;
pub use pyramid::{build_pyramid, Pyramid};
pub use refine::{refine_level, Direction, LevelReport};

use crate::feature::pyramid::FeatureExtractor;
use crate::feature::FeatureArray;
use crate::field::CorrespondenceField;
use crate::level::Level;
use crate::search::PatchMatchEngine;
use crate::trace::{trace_event, trace_span};
use crate::util::{PatchFlowError, PatchFlowResult};

/// Both images' levels at one depth, before merging.
pub struct DepthPair<'a> {
    depth: usize,
    first: &'a mut Level,
    second: &'a mut Level,
    first_parent: Option<&'a Level>,
    second_parent: Option<&'a Level>,
}

impl<'a> DepthPair<'a> {
    /// Groups the two levels of one depth with their coarser parents.
    pub fn new(
        first: &'a mut Level,
        second: &'a mut Level,
        first_parent: Option<&'a Level>,
        second_parent: Option<&'a Level>,
    ) -> Self {
        Self {
            depth: first.depth(),
            first,
            second,
            first_parent,
            second_parent,
        }
    }

    /// Merges the first level, then the second.
    pub fn merge(self) -> PatchFlowResult<MergedDepth<'a>> {
        merge(self.first, self.first_parent, self.second)?;
        merge(self.second, self.second_parent, self.first)?;
        Ok(MergedDepth {
            depth: self.depth,
            first: self.first,
            second: self.second,
        })
    }
}

/// Both images' levels at one depth, merged and ready for refinement.
pub struct MergedDepth<'a> {
    depth: usize,
    first: &'a mut Level,
    second: &'a mut Level,
}

impl MergedDepth<'_> {
    /// Returns the depth of this pair.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Refines the first image's field, then the second image's field.
    pub fn refine(
        self,
        engine: &mut PatchMatchEngine,
        iterations: usize,
    ) -> PatchFlowResult<[LevelReport; 2]> {
        let forward = refine_level(engine, self.first, self.second, iterations, Direction::FirstToSecond)?;
        let backward = refine_level(engine, self.second, self.first, iterations, Direction::SecondToFirst)?;
        Ok([forward, backward])
    }
}

/// Result of a full run.
#[derive(Clone, Debug)]
pub struct AnalogyOutput {
    /// First image's levels with fields into the second image.
    pub first: Pyramid,
    /// Second image's levels with fields into the first image.
    pub second: Pyramid,
    /// One report per depth and direction, in execution order.
    pub reports: Vec<LevelReport>,
}

impl AnalogyOutput {
    /// Finest field from the first image into the second.
    pub fn first_field(&self) -> &CorrespondenceField {
        self.first.finest_field()
    }

    /// Finest field from the second image into the first.
    pub fn second_field(&self) -> &CorrespondenceField {
        self.second.finest_field()
    }
}

/// Bidirectional analogy runner.
pub struct Analogy {
    config: FlowConfig,
    engine: PatchMatchEngine,
}

impl Analogy {
    /// Creates a runner; fails when the configuration is unusable.
    pub fn new(config: FlowConfig) -> PatchFlowResult<Self> {
        config.validate()?;
        let engine = PatchMatchEngine::new(config.seed)
            .with_radius_schedule(config.radius_schedule)
            .with_parallel(config.parallel);
        Ok(Self { config, engine })
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &FlowConfig {
        &self.config
    }

    /// Builds a pyramid with this runner's schedule.
    pub fn build_pyramid(&self, features: Vec<FeatureArray>) -> PatchFlowResult<Pyramid> {
        build_pyramid(features, &self.config)
    }

    /// Extracts features for both images and runs the analogy.
    pub fn run_images<E: FeatureExtractor + ?Sized>(
        &mut self,
        extractor: &E,
        first: &FeatureArray,
        second: &FeatureArray,
    ) -> PatchFlowResult<AnalogyOutput> {
        let first = extractor.extract(first)?.into_coarse_to_fine();
        let second = extractor.extract(second)?.into_coarse_to_fine();
        self.run_features(first, second)
    }

    /// Builds both pyramids from coarse-to-fine features and runs the analogy.
    pub fn run_features(
        &mut self,
        first: Vec<FeatureArray>,
        second: Vec<FeatureArray>,
    ) -> PatchFlowResult<AnalogyOutput> {
        let first = self.build_pyramid(first)?;
        let second = self.build_pyramid(second)?;
        self.run(first, second)
    }

    /// Refines both pyramids coarse to fine in lockstep.
    pub fn run(&mut self, mut first: Pyramid, mut second: Pyramid) -> PatchFlowResult<AnalogyOutput> {
        check_compatible(&first, &second)?;
        let _span = trace_span!("run", depths = first.len()).entered();

        for (a, b) in first.levels_mut().iter_mut().zip(second.levels_mut().iter_mut()) {
            a.field.bind_target(b.height(), b.width())?;
            b.field.bind_target(a.height(), a.width())?;
        }

        let mut reports = Vec::with_capacity(first.len() * 2);
        for depth in 0..first.len() {
            let (first_head, first_tail) = first.levels_mut().split_at_mut(depth);
            let (second_head, second_tail) = second.levels_mut().split_at_mut(depth);
            let pair = DepthPair::new(
                &mut first_tail[0],
                &mut second_tail[0],
                first_head.last(),
                second_head.last(),
            );
            let merged = pair.merge()?;
            reports.extend(merged.refine(&mut self.engine, self.config.iterations)?);
        }

        trace_event!(
            "run_done",
            depths = first.len(),
            first_score = first.finest_field().mean_score(),
            second_score = second.finest_field().mean_score(),
        );

        Ok(AnalogyOutput {
            first,
            second,
            reports,
        })
    }
}

fn check_compatible(first: &Pyramid, second: &Pyramid) -> PatchFlowResult<()> {
    if first.len() != second.len() {
        return Err(PatchFlowError::ShapeError {
            reason: "pyramids have different depth counts",
        });
    }
    for (a, b) in first.levels().iter().zip(second.levels().iter()) {
        if a.features().channels() != b.features().channels() {
            return Err(PatchFlowError::ShapeError {
                reason: "pyramid levels have different channel counts",
            });
        }
        if a.params().padding != b.params().padding {
            return Err(PatchFlowError::ShapeError {
                reason: "pyramid levels have different patch padding",
            });
        }
    }
    Ok(())
}
