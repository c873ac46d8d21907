//! Numeric helpers shared by patch extraction, scoring and blending.

/// Offsets `base` by `delta` and clamps the result to `[0, len)`.
///
/// `len` must be non-zero.
pub(crate) fn clamp_offset(base: usize, delta: isize, len: usize) -> usize {
    debug_assert!(len > 0);
    let max = (len - 1) as isize;
    (base as isize).saturating_add(delta).clamp(0, max) as usize
}

/// Euclidean norm of a vector, accumulated in `f64`.
pub(crate) fn l2_norm(values: &[f32]) -> f32 {
    let sum_sq: f64 = values.iter().map(|&v| (v as f64) * (v as f64)).sum();
    sum_sq.sqrt() as f32
}

/// Mean and sample standard deviation (`n - 1` denominator).
///
/// A single sample has zero deviation.
pub(crate) fn mean_std(values: &[f32]) -> (f32, f32) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().map(|&v| v as f64).sum::<f64>() / n;
    if values.len() < 2 {
        return (mean as f32, 0.0);
    }
    let var = values
        .iter()
        .map(|&v| {
            let d = v as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / (n - 1.0);
    (mean as f32, var.sqrt() as f32)
}

/// Logistic squash of a z-scored norm, scaled by the level weight.
pub(crate) fn squash_weight(weight: f32, z: f32) -> f32 {
    weight / (1.0 + (-10.0 * (z - 0.5)).exp())
}
