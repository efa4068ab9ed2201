//! Per-run analysis configuration.
//!
//! An explicit immutable value constructed per call; defaults mirror the
//! reference parameterization and nothing here is ever mutated in place.

use crate::domain::{PaxError, PaxResult};
use crate::numerics::log_spaced;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Measurement-axis resolution in eV.
    pub energy_spacing: f64,
    /// Per-fit iteration cap; every fit runs the full budget.
    pub iterations: usize,
    /// Replicate count of the simulated measurement set.
    pub simulations: usize,
    /// Cross-validation fold count for the grid search.
    pub cv_fold: usize,
    /// Candidate regularizer widths in eV.
    pub regularizer_widths: Vec<f64>,
    /// Worker-pool size for the per-width convergence fan-out.
    pub workers: usize,
    /// Seed of the shot-noise generator.
    pub seed: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            energy_spacing: 0.005,
            iterations: 1000,
            simulations: 1000,
            cv_fold: 4,
            regularizer_widths: log_spaced(-3.0, -1.0, 10),
            workers: 1,
            seed: 0,
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> PaxResult<()> {
        if !self.energy_spacing.is_finite() || self.energy_spacing <= 0.0 {
            return Err(PaxError::InvalidOption {
                option: "energy_spacing",
                reason: format!("must be finite and > 0, got {}", self.energy_spacing),
            });
        }
        if self.iterations == 0 {
            return Err(PaxError::InvalidOption {
                option: "iterations",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.simulations == 0 {
            return Err(PaxError::InvalidOption {
                option: "simulations",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.cv_fold < 2 {
            return Err(PaxError::InvalidOption {
                option: "cv_fold",
                reason: format!("must be at least 2, got {}", self.cv_fold),
            });
        }
        if self.workers == 0 {
            return Err(PaxError::InvalidOption {
                option: "workers",
                reason: "must be at least 1".to_string(),
            });
        }
        for &width in &self.regularizer_widths {
            if !width.is_finite() || width < 0.0 {
                return Err(PaxError::InvalidOption {
                    option: "regularizer_widths",
                    reason: format!("widths must be finite and >= 0, got {width}"),
                });
            }
        }
        Ok(())
    }

    /// The width grid with the `0` (unregularized) sentinel prepended when
    /// the supplied grid does not already contain it.
    pub fn widths_with_unregularized(&self) -> Vec<f64> {
        if self.regularizer_widths.contains(&0.0) {
            return self.regularizer_widths.clone();
        }
        let mut widths = Vec::with_capacity(self.regularizer_widths.len() + 1);
        widths.push(0.0);
        widths.extend_from_slice(&self.regularizer_widths);
        widths
    }
}
