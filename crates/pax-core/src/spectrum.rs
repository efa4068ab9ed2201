//! Discretized spectra and simulated measurement sets.
//!
//! A [`Spectrum`] pairs an energy axis with one intensity channel and is
//! immutable once constructed; every producing step in the pipeline builds a
//! new value instead of mutating an existing one.

use crate::domain::{PaxError, PaxResult};
use serde::{Deserialize, Serialize};

/// Relative tolerance for the uniform-spacing invariant.
const SPACING_RELATIVE_TOLERANCE: f64 = 1.0e-9;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spectrum {
    x: Vec<f64>,
    y: Vec<f64>,
}

impl Spectrum {
    /// Build a spectrum, enforcing the axis/intensity length invariant.
    ///
    /// Axis direction is deliberately unconstrained here: the impulse
    /// response carries a negated (decreasing) axis by construction.
    pub fn new(context: &'static str, x: Vec<f64>, y: Vec<f64>) -> PaxResult<Self> {
        if x.len() != y.len() {
            return Err(PaxError::LengthMismatch {
                context,
                x_len: x.len(),
                y_len: y.len(),
            });
        }
        if x.len() < 2 {
            return Err(PaxError::TooFewPoints {
                context,
                minimum: 2,
                actual: x.len(),
            });
        }
        Ok(Self { x, y })
    }

    pub fn x(&self) -> &[f64] {
        &self.x
    }

    pub fn y(&self) -> &[f64] {
        &self.y
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn total_intensity(&self) -> f64 {
        self.y.iter().sum()
    }

    /// Check that every intensity value is finite and non-negative and that
    /// at least one is strictly positive.
    pub fn validate_intensity(&self, context: &'static str) -> PaxResult<()> {
        for (index, value) in self.y.iter().copied().enumerate() {
            if !value.is_finite() || value < 0.0 {
                return Err(PaxError::InvalidIntensity {
                    context,
                    index,
                    value,
                });
            }
        }
        if self.total_intensity() == 0.0 {
            return Err(PaxError::ZeroIntensity { context });
        }
        Ok(())
    }

    /// Return the constant axis step, enforcing the strictly-increasing
    /// uniformly-spaced invariant.
    pub fn uniform_spacing(&self, context: &'static str) -> PaxResult<f64> {
        uniform_spacing_of(context, &self.x)
    }
}

/// Validate a strictly increasing, uniformly spaced axis and return its step.
pub fn uniform_spacing_of(context: &'static str, axis: &[f64]) -> PaxResult<f64> {
    if axis.len() < 2 {
        return Err(PaxError::TooFewPoints {
            context,
            minimum: 2,
            actual: axis.len(),
        });
    }

    let spacing = axis[1] - axis[0];
    for index in 1..axis.len() {
        let previous = axis[index - 1];
        let current = axis[index];
        if current <= previous {
            return Err(PaxError::NonMonotonicAxis {
                context,
                index,
                previous,
                current,
            });
        }
        let step = current - previous;
        if (step - spacing).abs() > SPACING_RELATIVE_TOLERANCE * spacing.abs().max(1.0) {
            return Err(PaxError::NonUniformSpacing {
                context,
                index,
                expected: spacing,
                actual: step,
            });
        }
    }

    Ok(spacing)
}

/// One kinetic-energy axis plus one Poisson realization per replicate.
///
/// Replicate order is stable but carries no meaning beyond indexing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementSet {
    pub x: Vec<f64>,
    pub y: Vec<Vec<f64>>,
}

impl MeasurementSet {
    pub fn replicate_count(&self) -> usize {
        self.y.len()
    }

    /// (replicates, axis length), the persisted-bundle shape diagnostic.
    pub fn shape(&self) -> (usize, usize) {
        (self.y.len(), self.x.len())
    }

    /// Element-wise mean over replicates.
    pub fn mean_replicate(&self) -> Vec<f64> {
        let mut mean = vec![0.0; self.x.len()];
        if self.y.is_empty() {
            return mean;
        }
        for replicate in &self.y {
            for (accumulated, value) in mean.iter_mut().zip(replicate) {
                *accumulated += value;
            }
        }
        let scale = 1.0 / self.y.len() as f64;
        for value in &mut mean {
            *value *= scale;
        }
        mean
    }
}

#[cfg(test)]
mod tests {
    use super::{MeasurementSet, Spectrum, uniform_spacing_of};
    use crate::domain::PaxError;

    #[test]
    fn construction_rejects_length_mismatch() {
        let error = Spectrum::new("test spectrum", vec![0.0, 1.0, 2.0], vec![1.0, 2.0])
            .expect_err("mismatched lengths should fail");
        assert!(matches!(
            error,
            PaxError::LengthMismatch {
                x_len: 3,
                y_len: 2,
                ..
            }
        ));
    }

    #[test]
    fn uniform_spacing_accepts_regular_axis() {
        let spacing =
            uniform_spacing_of("test axis", &[1.0, 1.005, 1.01, 1.015]).expect("uniform axis");
        assert!((spacing - 0.005).abs() < 1.0e-12);
    }

    #[test]
    fn uniform_spacing_rejects_non_monotonic_axis() {
        let error = uniform_spacing_of("test axis", &[0.0, 1.0, 0.5])
            .expect_err("decreasing step should fail");
        assert!(matches!(error, PaxError::NonMonotonicAxis { index: 2, .. }));
    }

    #[test]
    fn uniform_spacing_rejects_irregular_axis() {
        let error = uniform_spacing_of("test axis", &[0.0, 1.0, 2.5])
            .expect_err("irregular step should fail");
        assert!(matches!(error, PaxError::NonUniformSpacing { index: 2, .. }));
    }

    #[test]
    fn intensity_validation_flags_all_zero_and_negative_values() {
        let zero = Spectrum::new("test spectrum", vec![0.0, 1.0], vec![0.0, 0.0])
            .expect("valid shape")
            .validate_intensity("test spectrum")
            .expect_err("all-zero intensity should fail");
        assert!(matches!(zero, PaxError::ZeroIntensity { .. }));

        let negative = Spectrum::new("test spectrum", vec![0.0, 1.0], vec![1.0, -0.5])
            .expect("valid shape")
            .validate_intensity("test spectrum")
            .expect_err("negative intensity should fail");
        assert!(matches!(
            negative,
            PaxError::InvalidIntensity { index: 1, .. }
        ));
    }

    #[test]
    fn mean_replicate_averages_elementwise() {
        let set = MeasurementSet {
            x: vec![0.0, 1.0, 2.0],
            y: vec![vec![1.0, 2.0, 3.0], vec![3.0, 2.0, 1.0]],
        };
        assert_eq!(set.mean_replicate(), vec![2.0, 2.0, 2.0]);
        assert_eq!(set.shape(), (2, 3));
    }
}
