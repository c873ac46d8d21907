//! Error types for patchflow.

use thiserror::Error;

/// Result alias for patchflow operations.
pub type PatchFlowResult<T> = std::result::Result<T, PatchFlowError>;

/// Errors that abort a correspondence computation.
///
/// A zero-norm patch descriptor is not an error: it is left as a zero vector
/// and counted by [`crate::PatchBank::degenerate_count`].
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PatchFlowError {
    /// A shape precondition on a feature array, patch bank or level was violated.
    #[error("shape error: {reason}")]
    ShapeError { reason: &'static str },
    /// The upsampled parent field does not cover the child field exactly.
    #[error(
        "upsampled field is {got_height}x{got_width}, child field is {expected_height}x{expected_width}"
    )]
    ShapeMismatch {
        expected_height: usize,
        expected_width: usize,
        got_height: usize,
        got_width: usize,
    },
    /// The flow configuration cannot drive a run.
    #[error("invalid config: {reason}")]
    InvalidConfig { reason: &'static str },
    /// An index is outside the valid range.
    #[error("{context} index {index} out of bounds (len {len})")]
    IndexOutOfBounds {
        index: usize,
        len: usize,
        context: &'static str,
    },
    /// Image decoding or encoding failed.
    #[error("image I/O error: {reason}")]
    ImageIo { reason: String },
}
