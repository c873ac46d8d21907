//! SIMD-accelerated kernel using the `wide` crate.
//!
//! Descriptors are consumed eight lanes at a time with `f32x8`; the tail that
//! does not fill a full vector is finished with scalar code.

use crate::kernel::Kernel;
use wide::f32x8;

const LANES: usize = 8;

/// Load 8 f32 values into f32x8.
#[inline]
fn load_f32x8(slice: &[f32]) -> f32x8 {
    f32x8::from([
        slice[0], slice[1], slice[2], slice[3], slice[4], slice[5], slice[6], slice[7],
    ])
}

/// Horizontal sum of f32x8.
#[inline]
fn hsum(v: f32x8) -> f32 {
    v.to_array().iter().sum()
}

/// `f32x8` dot product with a scalar tail.
pub struct DotSimd;

impl Kernel for DotSimd {
    #[inline]
    fn dot(a: &[f32], b: &[f32]) -> f32 {
        debug_assert_eq!(a.len(), b.len());
        let len = a.len().min(b.len());
        let full = len - len % LANES;

        let mut acc = f32x8::ZERO;
        let mut i = 0;
        while i < full {
            acc += load_f32x8(&a[i..i + LANES]) * load_f32x8(&b[i..i + LANES]);
            i += LANES;
        }

        let mut sum = hsum(acc);
        for j in full..len {
            sum += a[j] * b[j];
        }
        sum
    }
}
