//! Energy-grid constructors.

/// Uniform axis `first, first + spacing, ...` with exactly `len` points.
///
/// Each point is computed directly from the index so long axes do not
/// accumulate floating-point drift.
pub fn uniform_axis(first: f64, spacing: f64, len: usize) -> Vec<f64> {
    (0..len).map(|index| first + spacing * index as f64).collect()
}

/// Uniform axis covering `[start, stop)` at the given spacing.
pub fn uniform_axis_over(start: f64, stop: f64, spacing: f64) -> Vec<f64> {
    let len = ((stop - start) / spacing).ceil().max(0.0) as usize;
    uniform_axis(start, spacing, len)
}

/// `count` log-spaced values from `10^first_exponent` to `10^last_exponent`
/// inclusive.
pub fn log_spaced(first_exponent: f64, last_exponent: f64, count: usize) -> Vec<f64> {
    if count == 0 {
        return Vec::new();
    }
    if count == 1 {
        return vec![10.0_f64.powf(first_exponent)];
    }
    let step = (last_exponent - first_exponent) / (count - 1) as f64;
    (0..count)
        .map(|index| 10.0_f64.powf(first_exponent + step * index as f64))
        .collect()
}
