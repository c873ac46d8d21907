//! Dot-product kernels used for descriptor scoring.
//!
//! Every patch comparison is a dot product of two unit descriptors, so the
//! engine spends almost all of its time here. The scalar kernel is the
//! reference; the `simd` feature swaps in a `wide`-based kernel.

/// Kernel trait for descriptor similarity.
pub trait Kernel {
    /// Dot product of two equal-length descriptors.
    fn dot(a: &[f32], b: &[f32]) -> f32;
}

pub mod scalar;

#[cfg(feature = "simd")]
pub mod simd;

#[cfg(feature = "rayon")]
pub mod rayon;

#[cfg(not(feature = "simd"))]
pub(crate) use scalar::DotScalar as ActiveKernel;
#[cfg(feature = "simd")]
pub(crate) use simd::DotSimd as ActiveKernel;
