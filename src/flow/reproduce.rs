//! Inter-level merge: seed a child field from its parent and rebuild the
//! child's reproduction descriptors.

use crate::bank::PatchBank;
use crate::feature::FeatureArray;
use crate::level::Level;
use crate::trace::trace_span;
use crate::util::{PatchFlowError, PatchFlowResult};

/// Seeds `child` from `parent` and blends in content from `opposing`.
///
/// Does nothing when `parent` is `None` (the coarsest depth). Otherwise the
/// parent's indices are upsampled 2x by duplication and doubled in value,
/// clamped into the opposing grid, and used to look up the opposing level's
/// own features. The child's reproduction features are
/// `own * w + warped * (1 - w)` with the child's per-cell weight `w`.
pub fn merge(child: &mut Level, parent: Option<&Level>, opposing: &Level) -> PatchFlowResult<()> {
    let Some(parent) = parent else {
        return Ok(());
    };

    let _span = trace_span!("merge", depth = child.depth()).entered();

    let (up_height, up_width, upsampled) = parent.field().upsample_indices();
    if up_height != child.height() || up_width != child.width() {
        return Err(PatchFlowError::ShapeMismatch {
            expected_height: child.height(),
            expected_width: child.width(),
            got_height: up_height,
            got_width: up_width,
        });
    }
    let channels = child.features().channels();
    if opposing.features().channels() != channels {
        return Err(PatchFlowError::ShapeError {
            reason: "opposing level has a different channel count",
        });
    }

    child.field.bind_target(opposing.height(), opposing.width())?;
    child.field.reseed(upsampled);

    let blended = blend_warped(child, opposing)?;
    let repro = PatchBank::extract(&blended, child.params().padding)?;
    child.set_repro(repro);
    Ok(())
}

/// Builds `own * w + warped * (1 - w)` where `warped` samples the opposing
/// features at each cell's current match.
fn blend_warped(child: &Level, opposing: &Level) -> PatchFlowResult<FeatureArray> {
    let own = child.features();
    let other = opposing.features();
    let (channels, height, width) = (own.channels(), own.height(), own.width());
    let weights = child.weights();
    let field = child.field();

    let mut data = own.as_slice().to_vec();
    let mut warped = vec![0.0f32; channels];
    let plane = height * width;
    for y in 0..height {
        for x in 0..width {
            let (c, _) = field.entry(y, x);
            other.read_cell(c.row, c.col, &mut warped);
            let cell = y * width + x;
            let w = weights[cell];
            for (ch, &value) in warped.iter().enumerate() {
                let slot = &mut data[ch * plane + cell];
                *slot = *slot * w + value * (1.0 - w);
            }
        }
    }

    FeatureArray::new(data, channels, height, width)
}
