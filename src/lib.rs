//! patchflow computes dense bidirectional correspondences ("visual
//! analogies") between two images with multiresolution PatchMatch.
//!
//! Each image is described by a coarse-to-fine sequence of feature arrays.
//! Fields are refined level by level: a coarser field seeds the next finer
//! one, reproduction descriptors blend in content warped from the opposing
//! image, and PatchMatch propagation plus random search improve both fields
//! greedily. Scalar kernels are the reference; `simd` and `rayon` features
//! accelerate scoring and random search.

pub mod bank;
pub mod feature;
pub mod field;
pub mod flow;
pub mod kernel;
pub mod level;
pub mod search;
mod trace;
pub mod util;
pub mod warp;

pub use bank::PatchBank;
pub use feature::pyramid::{BoxPyramidExtractor, FeatureExtractor, FeatureStack, LevelOrder};
pub use feature::FeatureArray;
pub use field::{Coord, CorrespondenceField};
pub use flow::{
    build_pyramid, merge, refine_level, Analogy, AnalogyOutput, DepthPair, Direction,
    FlowConfig, LevelReport, MergedDepth, Pyramid,
};
pub use level::{Level, LevelParams, LevelPatches};
pub use search::{score, PatchMatchEngine, RadiusSchedule};
pub use util::{PatchFlowError, PatchFlowResult};
pub use warp::warp_features;

#[cfg(feature = "image-io")]
pub use feature::io;
