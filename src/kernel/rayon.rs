//! Rayon-parallel random search (feature-gated).
//!
//! Random search has no cross-cell dependency within a call, so rows are
//! distributed across threads. Each row owns its `(indices, scores)` slices
//! and its own derived RNG, which keeps the result identical to the
//! sequential path.

use crate::field::CorrespondenceField;
use crate::search::random::{row_rng, RandomSearch};
use rayon::prelude::*;

/// Row-parallel random search over the whole field.
pub(crate) fn random_search_rows_par(
    search: &RandomSearch<'_>,
    field: &mut CorrespondenceField,
    call_seed: u64,
) {
    let width = field.width();
    let (indices, scores) = field.parts_mut();
    indices
        .par_chunks_mut(width)
        .zip(scores.par_chunks_mut(width))
        .enumerate()
        .for_each(|(y, (row_indices, row_scores))| {
            let mut rng = row_rng(call_seed, y);
            search.search_row(y, row_indices, row_scores, &mut rng);
        });
}
