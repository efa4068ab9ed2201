//! Valid-mode discrete convolution and its adjoint.
//!
//! The "valid" output length and the measurement-axis derivation are
//! load-bearing contracts of the measurement model, so they live here as
//! named pure functions rather than as incidental slice arithmetic.

/// Output length of a valid-mode (full-overlap-only) discrete convolution.
pub const fn valid_convolution_length(la: usize, lb: usize) -> usize {
    let (longer, shorter) = if la >= lb { (la, lb) } else { (lb, la) };
    longer - shorter + 1
}

/// Valid-mode discrete convolution of two non-empty sequences.
///
/// Either argument may be the longer one; the output keeps only the
/// positions where the shorter sequence overlaps the longer completely.
pub fn convolve_valid(a: &[f64], b: &[f64]) -> Vec<f64> {
    let (longer, shorter) = if a.len() >= b.len() { (a, b) } else { (b, a) };
    let output_len = valid_convolution_length(a.len(), b.len());
    let window = shorter.len();

    let mut output = vec![0.0; output_len];
    for (offset, slot) in output.iter_mut().enumerate() {
        let mut accumulated = 0.0;
        for (k, weight) in shorter.iter().enumerate() {
            accumulated += weight * longer[offset + window - 1 - k];
        }
        *slot = accumulated;
    }
    output
}

/// Adjoint of the valid-mode convolution operator `s -> valid(s, kernel)`
/// for an estimate of length `estimate_len`.
///
/// With `kernel` of length `H` and a residual of length `M = H - N + 1`
/// (`N = estimate_len`), entry `i` of the result is
/// `sum_j kernel[j + N - 1 - i] * residual[j]`, i.e. the back-projection of
/// the residual onto estimate space.
pub fn adjoint_valid(kernel: &[f64], residual: &[f64], estimate_len: usize) -> Vec<f64> {
    let mut output = vec![0.0; estimate_len];
    for (i, slot) in output.iter_mut().enumerate() {
        let mut accumulated = 0.0;
        for (j, value) in residual.iter().enumerate() {
            accumulated += kernel[j + estimate_len - 1 - i] * value;
        }
        *slot = accumulated;
    }
    output
}

/// Unit-area Gaussian smoothing kernel sampled on a uniform grid.
///
/// `sigma` and `spacing` share energy units; the window spans four standard
/// deviations each side (at least one sample).
pub fn gaussian_kernel(sigma: f64, spacing: f64) -> Vec<f64> {
    let sigma_points = sigma / spacing;
    let half_width = (4.0 * sigma_points).ceil().max(1.0) as usize;

    let mut kernel = Vec::with_capacity(2 * half_width + 1);
    for offset in -(half_width as isize)..=(half_width as isize) {
        let z = offset as f64 / sigma_points;
        kernel.push((-0.5 * z * z).exp());
    }
    let norm: f64 = kernel.iter().sum();
    for value in &mut kernel {
        *value /= norm;
    }
    kernel
}

/// Smooth `values` with a unit-area Gaussian, keeping the input length.
///
/// The window is renormalized near the boundaries so the smoothing operator
/// preserves a constant sequence exactly.
pub fn gaussian_smooth(values: &[f64], sigma: f64, spacing: f64) -> Vec<f64> {
    let kernel = gaussian_kernel(sigma, spacing);
    let half_width = kernel.len() / 2;

    let mut output = vec![0.0; values.len()];
    for (i, slot) in output.iter_mut().enumerate() {
        let mut accumulated = 0.0;
        let mut weight_sum = 0.0;
        for (k, weight) in kernel.iter().enumerate() {
            let offset = i as isize + k as isize - half_width as isize;
            if offset >= 0 && (offset as usize) < values.len() {
                accumulated += weight * values[offset as usize];
                weight_sum += weight;
            }
        }
        *slot = accumulated / weight_sum;
    }
    output
}
