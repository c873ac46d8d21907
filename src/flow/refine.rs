//! Per-level refinement loop.

use crate::flow::config::search_repeats;
use crate::level::Level;
use crate::search::PatchMatchEngine;
use crate::trace::{trace_event, trace_progress, trace_span};
use crate::util::PatchFlowResult;

/// Which correspondence a report describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// First image's field into the second image.
    FirstToSecond,
    /// Second image's field into the first image.
    SecondToFirst,
}

/// Summary of one `refine_level` call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LevelReport {
    /// Pyramid depth (0 is coarsest).
    pub depth: usize,
    /// Field direction.
    pub direction: Direction,
    /// Outer iterations run.
    pub iterations: usize,
    /// Mean field score after the last iteration.
    pub mean_score: f32,
    /// Exponential moving average of the mean score (progress only).
    pub ema_score: f32,
}

/// Refines `level`'s field against `opposing` for `iterations` outer steps.
///
/// The field is rescored first. Even steps propagate, alternating scan
/// direction on each propagation; odd steps run random search with the
/// level's radius and [`search_repeats`] draws per cell. The moving average
/// is reported only and never ends the loop early.
pub fn refine_level(
    engine: &mut PatchMatchEngine,
    level: &mut Level,
    opposing: &Level,
    iterations: usize,
    direction: Direction,
) -> PatchFlowResult<LevelReport> {
    let depth = level.depth();
    let radius = level.params().radius;
    let _span = trace_span!("refine_level", depth = depth, radius = radius).entered();

    engine.initialize(level, opposing)?;

    let times = search_repeats(radius);
    let mut propagations = 0usize;
    let mut ema = 0.0f32;
    let mut mean = level.field().mean_score();
    for i in 0..iterations {
        if i % 2 == 0 {
            engine.propagate(level, opposing, propagations)?;
            propagations += 1;
        } else {
            engine.random_search(level, opposing, times, radius)?;
        }
        mean = level.field().mean_score();
        ema = 0.5 * mean + 0.5 * ema;
        trace_progress!("refine_iteration", depth = depth, iteration = i, mean_score = mean, ema = ema);
    }

    trace_event!(
        "level_done",
        depth = depth,
        mean_score = mean,
        ema = ema,
        identity = level.field().identity_count(),
    );

    Ok(LevelReport {
        depth,
        direction,
        iterations,
        mean_score: mean,
        ema_score: ema,
    })
}
