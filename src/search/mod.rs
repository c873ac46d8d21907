//! PatchMatch search over a correspondence field.
//!
//! The engine mutates one level's field against an opposing level with three
//! steps: `initialize` (rescore every cell in place), `propagate` (spread
//! matches from scan-order neighbours) and `random_search` (sample new
//! candidates). Propagation and search accept a candidate only when it
//! scores strictly higher, so stored scores never decrease between them.

pub(crate) mod propagate;
pub(crate) mod random;
pub(crate) mod scan;

pub use scan::score;

#[cfg(feature = "rayon")]
use crate::kernel::rayon::random_search_rows_par;
use crate::level::Level;
use crate::search::random::{row_rng, RandomSearch};
use crate::util::PatchFlowResult;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// How the random-search radius evolves across repeats of one call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RadiusSchedule {
    /// Every repeat uses the configured radius.
    #[default]
    Fixed,
    /// The radius halves after each repeat, never dropping below 1.
    Decayed,
}

/// Seeded PatchMatch engine.
pub struct PatchMatchEngine {
    rng: StdRng,
    schedule: RadiusSchedule,
    #[cfg_attr(not(feature = "rayon"), allow(dead_code))]
    parallel: bool,
}

impl PatchMatchEngine {
    /// Creates a sequential engine with a fixed radius schedule.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            schedule: RadiusSchedule::Fixed,
            parallel: false,
        }
    }

    /// Sets the random-search radius schedule.
    pub fn with_radius_schedule(mut self, schedule: RadiusSchedule) -> Self {
        self.schedule = schedule;
        self
    }

    /// Runs random search on rows in parallel (requires the `rayon` feature;
    /// ignored otherwise).
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Returns the configured radius schedule.
    pub fn radius_schedule(&self) -> RadiusSchedule {
        self.schedule
    }

    /// Scores every cell of `level` under its current indices.
    pub fn initialize(&self, level: &mut Level, opposing: &Level) -> PatchFlowResult<()> {
        scan::check_field(&level.patches, &level.field, &opposing.patches)?;
        scan::initialize_field(&level.patches, &mut level.field, &opposing.patches);
        Ok(())
    }

    /// Runs one propagation sweep; `iteration` parity picks the direction.
    pub fn propagate(
        &self,
        level: &mut Level,
        opposing: &Level,
        iteration: usize,
    ) -> PatchFlowResult<()> {
        scan::check_field(&level.patches, &level.field, &opposing.patches)?;
        propagate::propagate_field(&level.patches, &mut level.field, &opposing.patches, iteration);
        Ok(())
    }

    /// Draws `times` candidates per cell.
    ///
    /// With `radius > 0` candidates perturb the current match by uniform
    /// offsets in `[-radius, radius)` per axis; otherwise they are uniform
    /// over the whole opposing grid.
    pub fn random_search(
        &mut self,
        level: &mut Level,
        opposing: &Level,
        times: usize,
        radius: i32,
    ) -> PatchFlowResult<()> {
        scan::check_field(&level.patches, &level.field, &opposing.patches)?;
        let call_seed: u64 = self.rng.random();
        let search = RandomSearch {
            source: &level.patches,
            target: &opposing.patches,
            times,
            radius,
            schedule: self.schedule,
            target_height: level.field.target_height(),
            target_width: level.field.target_width(),
        };

        #[cfg(feature = "rayon")]
        if self.parallel {
            random_search_rows_par(&search, &mut level.field, call_seed);
            return Ok(());
        }

        for (y, (indices, scores)) in level.field.rows_mut().enumerate() {
            let mut rng = row_rng(call_seed, y);
            search.search_row(y, indices, scores, &mut rng);
        }
        Ok(())
    }
}
