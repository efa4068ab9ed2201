//! Single-width Richardson-Lucy variants.

use super::{Deconvolver, DeconvolutionGeometry, IterationDiagnostic, mean_measurement};
use crate::domain::{PaxError, PaxResult};
use crate::numerics::{adjoint_valid, convolve_valid, gaussian_smooth};
use crate::spectrum::Spectrum;

/// Floor applied before divisions so empty channels cannot poison the
/// multiplicative update.
const INTENSITY_FLOOR: f64 = 1.0e-20;

/// Unregularized Richardson-Lucy deconvolver.
#[derive(Debug)]
pub struct LucyRichardson {
    inner: SingleDeconvolver,
}

impl LucyRichardson {
    pub fn new(
        impulse: &Spectrum,
        measurement_x: &[f64],
        iterations: usize,
        ground_truth_y: Option<&[f64]>,
        validation_y: Option<&[f64]>,
    ) -> PaxResult<Self> {
        Ok(Self {
            inner: SingleDeconvolver::new(
                impulse,
                measurement_x,
                iterations,
                None,
                ground_truth_y,
                validation_y,
            )?,
        })
    }
}

impl Deconvolver for LucyRichardson {
    fn fit(&mut self, measurements: &[Vec<f64>]) -> PaxResult<()> {
        self.inner.fit(measurements)
    }

    fn deconvolved(&self) -> Option<&Spectrum> {
        self.inner.deconvolved.as_ref()
    }

    fn diagnostics(&self) -> &[IterationDiagnostic] {
        &self.inner.diagnostics
    }
}

/// Fister-regularized variant: the Richardson-Lucy update followed by
/// convolution of the running estimate with a unit-area Gaussian of
/// standard deviation `regularizer_width` (energy units) each iteration.
#[derive(Debug)]
pub struct FisterDeconvolver {
    inner: SingleDeconvolver,
}

impl FisterDeconvolver {
    pub fn new(
        impulse: &Spectrum,
        measurement_x: &[f64],
        regularizer_width: f64,
        iterations: usize,
        ground_truth_y: Option<&[f64]>,
        validation_y: Option<&[f64]>,
    ) -> PaxResult<Self> {
        if !regularizer_width.is_finite() || regularizer_width <= 0.0 {
            return Err(PaxError::InvalidOption {
                option: "regularizer_width",
                reason: format!("must be finite and > 0, got {regularizer_width}"),
            });
        }
        Ok(Self {
            inner: SingleDeconvolver::new(
                impulse,
                measurement_x,
                iterations,
                Some(regularizer_width),
                ground_truth_y,
                validation_y,
            )?,
        })
    }
}

impl Deconvolver for FisterDeconvolver {
    fn fit(&mut self, measurements: &[Vec<f64>]) -> PaxResult<()> {
        self.inner.fit(measurements)
    }

    fn deconvolved(&self) -> Option<&Spectrum> {
        self.inner.deconvolved.as_ref()
    }

    fn diagnostics(&self) -> &[IterationDiagnostic] {
        &self.inner.diagnostics
    }
}

#[derive(Debug)]
pub(crate) struct SingleDeconvolver {
    geometry: DeconvolutionGeometry,
    iterations: usize,
    regularizer_width: Option<f64>,
    ground_truth_y: Option<Vec<f64>>,
    validation_y: Option<Vec<f64>>,
    pub(crate) diagnostics: Vec<IterationDiagnostic>,
    pub(crate) deconvolved: Option<Spectrum>,
}

impl SingleDeconvolver {
    pub(crate) fn new(
        impulse: &Spectrum,
        measurement_x: &[f64],
        iterations: usize,
        regularizer_width: Option<f64>,
        ground_truth_y: Option<&[f64]>,
        validation_y: Option<&[f64]>,
    ) -> PaxResult<Self> {
        let geometry = DeconvolutionGeometry::new(impulse, measurement_x)?;
        if iterations == 0 {
            return Err(PaxError::InvalidOption {
                option: "iterations",
                reason: "must be at least 1".to_string(),
            });
        }
        if let Some(ground_truth) = ground_truth_y
            && ground_truth.len() != geometry.estimate_len()
        {
            return Err(PaxError::LengthMismatch {
                context: "ground-truth curve",
                x_len: geometry.estimate_len(),
                y_len: ground_truth.len(),
            });
        }
        if let Some(validation) = validation_y
            && validation.len() != geometry.measurement_len
        {
            return Err(PaxError::LengthMismatch {
                context: "validation measurement",
                x_len: geometry.measurement_len,
                y_len: validation.len(),
            });
        }

        Ok(Self {
            geometry,
            iterations,
            regularizer_width,
            ground_truth_y: ground_truth_y.map(<[f64]>::to_vec),
            validation_y: validation_y.map(<[f64]>::to_vec),
            diagnostics: Vec::new(),
            deconvolved: None,
        })
    }

    pub(crate) fn fit(&mut self, measurements: &[Vec<f64>]) -> PaxResult<()> {
        let mean = mean_measurement(measurements, self.geometry.measurement_len)?;
        let estimate = self.invert(&mean);
        self.deconvolved = Some(Spectrum::new(
            "deconvolved spectrum",
            self.geometry.estimate_x.clone(),
            estimate,
        )?);
        Ok(())
    }

    /// Run the iteration budget to completion; no early stopping.
    fn invert(&mut self, mean: &[f64]) -> Vec<f64> {
        let kernel = &self.geometry.impulse_y;
        let estimate_len = self.geometry.estimate_len();
        let spacing = self.geometry.estimate_spacing();

        // A^T 1: per-channel kernel mass seen by each estimate element.
        let weights = adjoint_valid(kernel, &vec![1.0; mean.len()], estimate_len);
        let mean_level = mean.iter().sum::<f64>() / mean.len() as f64;
        let mut estimate = vec![mean_level.max(INTENSITY_FLOOR); estimate_len];

        self.diagnostics.clear();
        self.diagnostics.reserve(self.iterations);
        for iteration in 0..self.iterations {
            let predicted = convolve_valid(kernel, &estimate);
            let ratio: Vec<f64> = mean
                .iter()
                .zip(&predicted)
                .map(|(observed, modeled)| observed / modeled.max(INTENSITY_FLOOR))
                .collect();
            let correction = adjoint_valid(kernel, &ratio, estimate_len);
            for ((value, correction), weight) in
                estimate.iter_mut().zip(&correction).zip(&weights)
            {
                *value *= correction / weight.max(INTENSITY_FLOOR);
            }
            if let Some(width) = self.regularizer_width {
                estimate = gaussian_smooth(&estimate, width, spacing);
            }

            self.diagnostics
                .push(self.diagnose(iteration, &estimate, mean));
        }

        estimate
    }

    fn diagnose(
        &self,
        iteration: usize,
        estimate: &[f64],
        mean: &[f64],
    ) -> IterationDiagnostic {
        let predicted = convolve_valid(&self.geometry.impulse_y, estimate);
        IterationDiagnostic {
            iteration,
            reconstruction_error: mean_squared_error(&predicted, mean),
            ground_truth_error: self
                .ground_truth_y
                .as_deref()
                .map(|truth| root_mean_squared_error(estimate, truth)),
            validation_error: self
                .validation_y
                .as_deref()
                .map(|held_out| mean_squared_error(&predicted, held_out)),
        }
    }
}

pub(crate) fn mean_squared_error(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(left, right)| (left - right) * (left - right))
        .sum::<f64>()
        / a.len() as f64
}

pub(crate) fn root_mean_squared_error(a: &[f64], b: &[f64]) -> f64 {
    mean_squared_error(a, b).sqrt()
}

#[cfg(test)]
mod tests {
    use super::{Deconvolver, FisterDeconvolver, LucyRichardson};
    use crate::domain::PaxError;
    use crate::numerics::{convolve_valid, gaussian_kernel, uniform_axis};
    use crate::spectrum::Spectrum;

    /// Gaussian impulse response on a negated axis, plus the measurement a
    /// two-line source produces through it.
    fn synthetic_problem() -> (Spectrum, Vec<f64>, Vec<f64>, Vec<f64>) {
        let kernel_y = gaussian_kernel(0.05, 0.01);
        let kernel_len = kernel_y.len();
        let impulse_x: Vec<f64> = uniform_axis(360.0, 0.01, kernel_len)
            .iter()
            .map(|v| -v)
            .collect();
        let impulse =
            Spectrum::new("impulse response", impulse_x, kernel_y.clone()).expect("impulse");

        let source_len = kernel_len.saturating_sub(21).max(5);
        let mut source = vec![0.0; source_len];
        source[source_len / 3] = 1.0;
        source[2 * source_len / 3] = 0.6;

        let measurement = convolve_valid(&kernel_y, &source);
        let measurement_x = uniform_axis(410.0, 0.01, measurement.len());
        (impulse, measurement_x, measurement, source)
    }

    #[test]
    fn reconstruction_error_decreases_over_iterations() {
        let (impulse, measurement_x, measurement, _) = synthetic_problem();
        let mut solver =
            LucyRichardson::new(&impulse, &measurement_x, 50, None, None).expect("solver");
        solver.fit(&[measurement]).expect("fit");

        let diagnostics = solver.diagnostics();
        assert_eq!(diagnostics.len(), 50);
        assert!(
            diagnostics[49].reconstruction_error < diagnostics[0].reconstruction_error,
            "multiplicative updates should reduce the data misfit"
        );
        assert!(diagnostics[0].ground_truth_error.is_none());
        assert!(diagnostics[0].validation_error.is_none());
    }

    #[test]
    fn estimate_lives_on_the_derived_axis_and_stays_non_negative() {
        let (impulse, measurement_x, measurement, source) = synthetic_problem();
        let mut solver =
            LucyRichardson::new(&impulse, &measurement_x, 100, None, None).expect("solver");
        solver.fit(&[measurement]).expect("fit");

        let deconvolved = solver.deconvolved().expect("fitted estimate");
        assert_eq!(deconvolved.len(), source.len());
        assert!(deconvolved.y().iter().all(|&value| value >= 0.0));
        assert!(
            (deconvolved.x()[0] - (410.0 + 360.0)).abs() < 1.0e-9,
            "estimate axis starts at measurement.x[0] - impulse.x[0]"
        );
    }

    #[test]
    fn ground_truth_and_validation_channels_are_logged_when_supplied() {
        let (impulse, measurement_x, measurement, source) = synthetic_problem();
        let mut solver = FisterDeconvolver::new(
            &impulse,
            &measurement_x,
            0.03,
            20,
            Some(&source),
            Some(&measurement),
        )
        .expect("solver");
        solver.fit(&[measurement]).expect("fit");

        for diagnostic in solver.diagnostics() {
            assert!(diagnostic.ground_truth_error.is_some());
            assert!(diagnostic.validation_error.is_some());
        }
    }

    #[test]
    fn regularized_estimate_is_smoother_than_the_unregularized_one() {
        let (impulse, measurement_x, measurement, _) = synthetic_problem();

        let mut plain =
            LucyRichardson::new(&impulse, &measurement_x, 150, None, None).expect("solver");
        plain.fit(std::slice::from_ref(&measurement)).expect("fit");
        let mut regularized =
            FisterDeconvolver::new(&impulse, &measurement_x, 0.05, 150, None, None)
                .expect("solver");
        regularized.fit(&[measurement]).expect("fit");

        let roughness = |spectrum: &Spectrum| -> f64 {
            spectrum
                .y()
                .windows(2)
                .map(|pair| (pair[1] - pair[0]).abs())
                .sum()
        };
        let plain_roughness = roughness(plain.deconvolved().expect("plain estimate"));
        let regularized_roughness =
            roughness(regularized.deconvolved().expect("regularized estimate"));
        assert!(
            regularized_roughness < plain_roughness,
            "smoothing should damp point-to-point variation: {regularized_roughness} vs {plain_roughness}"
        );
    }

    #[test]
    fn zero_regularizer_width_is_rejected_by_the_fister_variant() {
        let (impulse, measurement_x, _, _) = synthetic_problem();
        let error = FisterDeconvolver::new(&impulse, &measurement_x, 0.0, 10, None, None)
            .expect_err("zero width should fail");
        assert!(matches!(
            error,
            PaxError::InvalidOption {
                option: "regularizer_width",
                ..
            }
        ));
    }

    #[test]
    fn mismatched_ground_truth_length_is_rejected() {
        let (impulse, measurement_x, _, _) = synthetic_problem();
        let error = LucyRichardson::new(&impulse, &measurement_x, 10, Some(&[1.0, 2.0]), None)
            .expect_err("wrong ground-truth length should fail");
        assert!(matches!(
            error,
            PaxError::LengthMismatch {
                context: "ground-truth curve",
                ..
            }
        ));
    }
}
