//! Directional propagation of good matches.
//!
//! Scan contract: a sweep visits cells strictly in scan order and updates
//! each cell in place before moving on, so a cell reads neighbours that were
//! already improved earlier in the same sweep. That read-after-write chain is
//! what lets a good match travel across the whole field in one pass; the
//! sweep must stay sequential.
//!
//! Even iterations scan top-left to bottom-right and look at the cells above
//! and to the left; odd iterations scan bottom-right to top-left and look at
//! the cells below and to the right.

use crate::field::{Coord, CorrespondenceField};
use crate::level::LevelPatches;
use crate::search::scan::score_at;
use crate::util::math::clamp_offset;

/// Neighbour offsets `(dy, dx)` examined for an iteration parity.
pub(crate) fn neighbour_offsets(iteration: usize) -> [(isize, isize); 2] {
    let step = if iteration % 2 == 0 { -1 } else { 1 };
    [(0, step), (step, 0)]
}

/// Cell visiting order for an iteration parity.
fn scan_order(len: usize, forward: bool) -> impl Iterator<Item = usize> {
    (0..len).map(move |i| if forward { i } else { len - 1 - i })
}

pub(crate) fn propagate_field(
    source: &LevelPatches,
    field: &mut CorrespondenceField,
    target: &LevelPatches,
    iteration: usize,
) {
    let forward = iteration % 2 == 0;
    let offsets = neighbour_offsets(iteration);
    let (height, width) = (field.height(), field.width());
    let (target_height, target_width) = (field.target_height(), field.target_width());

    for y in scan_order(height, forward) {
        for x in scan_order(width, forward) {
            for &(dy, dx) in offsets.iter() {
                let ny = clamp_offset(y, dy, height);
                let nx = clamp_offset(x, dx, width);
                let (neighbour, _) = field.entry(ny, nx);
                let candidate = Coord::new(
                    clamp_offset(neighbour.row, -dy, target_height),
                    clamp_offset(neighbour.col, -dx, target_width),
                );

                let s = score_at(source, y, x, target, candidate.row, candidate.col);
                let (_, best) = field.entry(y, x);
                if s > best {
                    field.set(y, x, candidate, s);
                }
            }
        }
    }
}
