//! Run configuration for the coarse-to-fine analogy.

use crate::level::LevelParams;
use crate::search::RadiusSchedule;
use crate::util::{PatchFlowError, PatchFlowResult};

/// Configuration for a full analogy run.
///
/// `levels` is ordered coarse to fine and aligned at its fine end: a feature
/// sequence with `n` levels uses the last `n` entries, so the finest schedule
/// entry always applies to the finest features. With the default schedule a
/// three-level pyramid takes weights `[0.7, 0.6, 0.1]` and radii `[6, 4, 4]`.
#[derive(Clone, Debug)]
pub struct FlowConfig {
    /// Per-depth parameters, coarse to fine.
    pub levels: Vec<LevelParams>,
    /// Outer refinement iterations per level (even: propagate, odd: search).
    pub iterations: usize,
    /// Radius evolution across repeats of one random-search call.
    pub radius_schedule: RadiusSchedule,
    /// Seed for the random-search RNG.
    pub seed: u64,
    /// Parallel random search (requires the `rayon` feature).
    pub parallel: bool,
}

impl Default for FlowConfig {
    fn default() -> Self {
        let weights = [1.0, 0.8, 0.7, 0.6, 0.1];
        let radii = [-1, 6, 6, 4, 4];
        let paddings = [1, 1, 1, 2, 2];
        let levels = weights
            .iter()
            .zip(radii.iter())
            .zip(paddings.iter())
            .map(|((&weight, &radius), &padding)| LevelParams {
                weight,
                radius,
                padding,
            })
            .collect();
        Self {
            levels,
            iterations: 32,
            radius_schedule: RadiusSchedule::Fixed,
            seed: 0,
            parallel: false,
        }
    }
}

impl FlowConfig {
    /// Returns the parameters for `depth` of a pyramid with `depths` levels.
    ///
    /// Depth 0 is the coarsest level; `depths - 1` takes the last entry.
    pub fn level(&self, depth: usize, depths: usize) -> PatchFlowResult<LevelParams> {
        let offset = self
            .levels
            .len()
            .checked_sub(depths)
            .ok_or(PatchFlowError::ShapeError {
                reason: "level schedule is shorter than the feature sequence",
            })?;
        if depth >= depths {
            return Err(PatchFlowError::IndexOutOfBounds {
                index: depth,
                len: depths,
                context: "pyramid depth",
            });
        }
        self.levels
            .get(offset + depth)
            .copied()
            .ok_or(PatchFlowError::IndexOutOfBounds {
                index: offset + depth,
                len: self.levels.len(),
                context: "level schedule",
            })
    }

    /// Checks the configuration on its own.
    pub fn validate(&self) -> PatchFlowResult<()> {
        if self.levels.is_empty() {
            return Err(PatchFlowError::InvalidConfig {
                reason: "level schedule is empty",
            });
        }
        if self.iterations == 0 {
            return Err(PatchFlowError::InvalidConfig {
                reason: "iterations must be at least 1",
            });
        }
        if self
            .levels
            .iter()
            .any(|p| !p.weight.is_finite() || p.weight < 0.0)
        {
            return Err(PatchFlowError::InvalidConfig {
                reason: "level weights must be finite and non-negative",
            });
        }
        Ok(())
    }
}

/// Number of random-search repeats per call for a level radius.
///
/// The floor of 12 applies to positive radii too: radii 4 and 6 draw 6
/// candidates per cell, not the 2 or 3 a plain `radius / 2` would give.
pub fn search_repeats(radius: i32) -> usize {
    (radius.max(12) / 2) as usize
}

#[cfg(test)]
mod tests {
    use super::{search_repeats, FlowConfig};
    use crate::PatchFlowError;

    #[test]
    fn default_schedule_is_coarse_to_fine() {
        let cfg = FlowConfig::default();
        assert_eq!(cfg.levels.len(), 5);
        assert_eq!(cfg.levels[0].radius, -1);
        assert_eq!(cfg.levels[4].padding, 2);
        assert!((cfg.levels[4].weight - 0.1).abs() < 1e-6);
        assert_eq!(cfg.iterations, 32);
        cfg.validate().unwrap();
    }

    #[test]
    fn short_pyramids_take_the_fine_end_of_the_schedule() {
        let cfg = FlowConfig::default();
        let weights: Vec<f32> = (0..3).map(|d| cfg.level(d, 3).unwrap().weight).collect();
        let radii: Vec<i32> = (0..3).map(|d| cfg.level(d, 3).unwrap().radius).collect();
        assert_eq!(weights, vec![0.7, 0.6, 0.1]);
        assert_eq!(radii, vec![6, 4, 4]);
        assert_eq!(cfg.level(0, 5).unwrap().radius, -1);
        assert_eq!(cfg.level(2, 3).unwrap().padding, 2);
    }

    #[test]
    fn repeats_have_a_floor() {
        assert_eq!(search_repeats(-1), 6);
        assert_eq!(search_repeats(4), 6);
        assert_eq!(search_repeats(20), 10);
    }

    #[test]
    fn validate_rejects_empty_and_zero_budget() {
        let cfg = FlowConfig {
            levels: Vec::new(),
            ..FlowConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(PatchFlowError::InvalidConfig { .. })));
        let cfg = FlowConfig {
            iterations: 0,
            ..FlowConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(PatchFlowError::InvalidConfig { .. })));
        assert!(matches!(
            FlowConfig::default().level(9, 5),
            Err(PatchFlowError::IndexOutOfBounds { index: 9, .. })
        ));
        assert!(matches!(
            FlowConfig::default().level(0, 6),
            Err(PatchFlowError::ShapeError { .. })
        ));
    }
}
