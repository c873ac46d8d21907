//! Scalar reference kernel.

use crate::kernel::Kernel;

/// Straight-line scalar dot product.
pub struct DotScalar;

impl Kernel for DotScalar {
    #[inline]
    fn dot(a: &[f32], b: &[f32]) -> f32 {
        debug_assert_eq!(a.len(), b.len());
        a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::DotScalar;
    use crate::kernel::Kernel;

    #[test]
    fn dot_matches_hand_computation() {
        let a = [1.0f32, 2.0, 3.0];
        let b = [4.0f32, -5.0, 6.0];
        assert!((DotScalar::dot(&a, &b) - 12.0).abs() < 1e-6);
        assert_eq!(DotScalar::dot(&[], &[]), 0.0);
    }
}
