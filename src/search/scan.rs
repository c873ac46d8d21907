//! Bidirectional patch scoring and full-field (re)initialization.
//!
//! The score of matching source cell `(y, x)` to target cell `(v, u)` is
//!
//! `0.5 * (dot(src.repro[y,x], dst.orign[v,u]) + dot(src.orign[y,x], dst.repro[v,u]))`
//!
//! so a match is rewarded when the blended content of one side agrees with
//! the genuine content of the other, in both directions. With unit
//! descriptors each term is a cosine in `[-1, 1]`.

use crate::field::CorrespondenceField;
use crate::kernel::{ActiveKernel, Kernel};
use crate::level::LevelPatches;
use crate::util::{PatchFlowError, PatchFlowResult};

#[inline]
pub(crate) fn score_at(
    source: &LevelPatches,
    y: usize,
    x: usize,
    target: &LevelPatches,
    v: usize,
    u: usize,
) -> f32 {
    let forward = ActiveKernel::dot(source.repro.at(y, x), target.orign.at(v, u));
    let backward = ActiveKernel::dot(source.orign.at(y, x), target.repro.at(v, u));
    0.5 * (forward + backward)
}

/// Scores source cell `(y, x)` against target cell `(v, u)`.
pub fn score(
    source: &LevelPatches,
    y: usize,
    x: usize,
    target: &LevelPatches,
    v: usize,
    u: usize,
) -> PatchFlowResult<f32> {
    check_descriptors(source, target)?;
    let src = &source.orign;
    if y >= src.height() || x >= src.width() {
        return Err(PatchFlowError::IndexOutOfBounds {
            index: y * src.width() + x,
            len: src.height() * src.width(),
            context: "source cell",
        });
    }
    let dst = &target.orign;
    if v >= dst.height() || u >= dst.width() {
        return Err(PatchFlowError::IndexOutOfBounds {
            index: v * dst.width() + u,
            len: dst.height() * dst.width(),
            context: "target cell",
        });
    }
    Ok(score_at(source, y, x, target, v, u))
}

/// Recomputes every stored score under the field's current indices.
pub(crate) fn initialize_field(
    source: &LevelPatches,
    field: &mut CorrespondenceField,
    target: &LevelPatches,
) {
    for y in 0..field.height() {
        for x in 0..field.width() {
            let (c, _) = field.entry(y, x);
            let s = score_at(source, y, x, target, c.row, c.col);
            field.set(y, x, c, s);
        }
    }
}

fn check_descriptors(source: &LevelPatches, target: &LevelPatches) -> PatchFlowResult<()> {
    let dim = source.orign.dim();
    if source.repro.dim() != dim || target.orign.dim() != dim || target.repro.dim() != dim {
        return Err(PatchFlowError::ShapeError {
            reason: "descriptor lengths differ between source and target",
        });
    }
    Ok(())
}

/// Validates that the banks cover the field and its target grid.
pub(crate) fn check_field(
    source: &LevelPatches,
    field: &CorrespondenceField,
    target: &LevelPatches,
) -> PatchFlowResult<()> {
    check_descriptors(source, target)?;
    for bank in [&source.orign, &source.repro] {
        if bank.height() != field.height() || bank.width() != field.width() {
            return Err(PatchFlowError::ShapeError {
                reason: "source patch bank does not cover the field",
            });
        }
    }
    for bank in [&target.orign, &target.repro] {
        if bank.height() != field.target_height() || bank.width() != field.target_width() {
            return Err(PatchFlowError::ShapeError {
                reason: "target patch bank does not cover the field target grid",
            });
        }
    }
    Ok(())
}
