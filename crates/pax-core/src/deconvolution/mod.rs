//! Regularized iterative deconvolution of PAX measurements.
//!
//! Two single-width variants share one multiplicative-update core:
//! [`LucyRichardson`] (unregularized) and [`FisterDeconvolver`] (the same
//! update followed by Gaussian smoothing of the running estimate). The
//! cross-validated [`FisterGrid`] selects a width over a candidate grid.

pub mod grid_search;
pub mod lucy;

pub use grid_search::{FisterGrid, FittedGrid};
pub use lucy::{FisterDeconvolver, LucyRichardson};

use crate::domain::{PaxError, PaxResult};
use crate::spectrum::{Spectrum, uniform_spacing_of};
use serde::{Deserialize, Serialize};

/// Per-iteration convergence record.
///
/// `reconstruction_error` is the mean squared error of the re-convolved
/// estimate against the fitted measurement mean; the optional channels are
/// only present when ground truth / a held-out validation curve were
/// supplied at construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IterationDiagnostic {
    pub iteration: usize,
    pub reconstruction_error: f64,
    pub ground_truth_error: Option<f64>,
    pub validation_error: Option<f64>,
}

/// Shared contract of all deconvolver variants.
pub trait Deconvolver {
    /// Fit against a replicate matrix (rows = replicates, columns = the
    /// measurement axis). Rows are averaged before inversion.
    fn fit(&mut self, measurements: &[Vec<f64>]) -> PaxResult<()>;

    /// Recovered source estimate, available after a successful `fit`.
    fn deconvolved(&self) -> Option<&Spectrum>;

    /// Per-iteration diagnostics accumulated by the last `fit`.
    fn diagnostics(&self) -> &[IterationDiagnostic];
}

/// Axis geometry tying the estimate to the measurement grid.
///
/// For a measurement of length `M` and an impulse response of length `H`
/// (`H > M`), the estimate has `H - M + 1` points at the measurement
/// spacing, starting at `measurement.x[0] - impulse.x[0]`.
#[derive(Debug, Clone)]
pub(crate) struct DeconvolutionGeometry {
    pub(crate) impulse_y: Vec<f64>,
    pub(crate) measurement_len: usize,
    pub(crate) estimate_x: Vec<f64>,
}

impl DeconvolutionGeometry {
    pub(crate) fn new(impulse: &Spectrum, measurement_x: &[f64]) -> PaxResult<Self> {
        let spacing = uniform_spacing_of("measurement axis", measurement_x)?;
        if impulse.len() <= measurement_x.len() {
            return Err(PaxError::BroadeningTooShort {
                broadening_len: impulse.len(),
                source_len: measurement_x.len(),
            });
        }
        for (index, value) in impulse.y().iter().copied().enumerate() {
            if !value.is_finite() || value < 0.0 {
                return Err(PaxError::InvalidIntensity {
                    context: "impulse response",
                    index,
                    value,
                });
            }
        }

        let estimate_len = impulse.len() - measurement_x.len() + 1;
        let first_point = measurement_x[0] - impulse.x()[0];
        let estimate_x = crate::numerics::uniform_axis(first_point, spacing, estimate_len);

        Ok(Self {
            impulse_y: impulse.y().to_vec(),
            measurement_len: measurement_x.len(),
            estimate_x,
        })
    }

    pub(crate) fn estimate_len(&self) -> usize {
        self.estimate_x.len()
    }

    pub(crate) fn estimate_spacing(&self) -> f64 {
        self.estimate_x[1] - self.estimate_x[0]
    }
}

/// Average a replicate matrix into one measurement row, validating shape.
pub(crate) fn mean_measurement(
    measurements: &[Vec<f64>],
    expected_len: usize,
) -> PaxResult<Vec<f64>> {
    if measurements.is_empty() {
        return Err(PaxError::TooFewPoints {
            context: "measurement matrix",
            minimum: 1,
            actual: 0,
        });
    }
    for row in measurements {
        if row.len() != expected_len {
            return Err(PaxError::LengthMismatch {
                context: "measurement matrix",
                x_len: expected_len,
                y_len: row.len(),
            });
        }
    }

    let mut mean = vec![0.0; expected_len];
    for row in measurements {
        for (accumulated, value) in mean.iter_mut().zip(row) {
            *accumulated += value;
        }
    }
    let scale = 1.0 / measurements.len() as f64;
    for value in &mut mean {
        *value *= scale;
    }
    Ok(mean)
}
