//! Per-width convergence assessment.
//!
//! Fits one single-width deconvolver per candidate width against a primary
//! simulated measurement set, scoring every iteration against the ground
//! truth and against the mean of an independent validation set simulated at
//! a lower count budget. The unregularized width is always part of the
//! sweep so regularized traces have a baseline.

use crate::config::AnalysisConfig;
use crate::deconvolution::{
    Deconvolver, FisterDeconvolver, IterationDiagnostic, LucyRichardson,
};
use crate::domain::{PaxError, PaxResult};
use crate::simulation::simulate_from_presets;
use crate::spectrum::Spectrum;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rayon::prelude::*;
use serde::Serialize;

/// Offset applied to the primary count exponent for the validation set,
/// roughly halving the validation count budget.
const VALIDATION_EXPONENT_OFFSET: f64 = 0.33;

/// Full iteration trace of one candidate width.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WidthConvergence {
    pub width: f64,
    pub diagnostics: Vec<IterationDiagnostic>,
    pub deconvolved: Spectrum,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConvergenceReport {
    pub count_exponent: f64,
    pub validation_exponent: f64,
    pub iterations: usize,
    pub runs: Vec<WidthConvergence>,
}

/// Simulate primary and validation sets at the given parameterization and
/// trace every candidate width to the iteration cap.
pub fn assess_convergence(
    count_exponent: f64,
    rixs_preset: &str,
    photoemission_preset: &str,
    config: &AnalysisConfig,
) -> PaxResult<ConvergenceReport> {
    config.validate()?;

    let mut rng = StdRng::seed_from_u64(config.seed);
    let (impulse, primary, xray) = simulate_from_presets(
        count_exponent,
        rixs_preset,
        photoemission_preset,
        config.simulations,
        config.energy_spacing,
        &mut rng,
    )?;

    let validation_exponent = count_exponent - VALIDATION_EXPONENT_OFFSET;
    let (_, validation, _) = simulate_from_presets(
        validation_exponent,
        rixs_preset,
        photoemission_preset,
        config.simulations,
        config.energy_spacing,
        &mut rng,
    )?;
    let validation_mean = validation.mean_replicate();

    let widths = config.widths_with_unregularized();
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.workers)
        .build()
        .map_err(|error| PaxError::InvalidOption {
            option: "workers",
            reason: error.to_string(),
        })?;

    let runs = pool.install(|| {
        widths
            .par_iter()
            .map(|&width| {
                trace_width(
                    width,
                    &impulse,
                    &primary.x,
                    &primary.y,
                    config.iterations,
                    xray.y(),
                    &validation_mean,
                )
            })
            .collect::<PaxResult<Vec<_>>>()
    })?;

    Ok(ConvergenceReport {
        count_exponent,
        validation_exponent,
        iterations: config.iterations,
        runs,
    })
}

fn trace_width(
    width: f64,
    impulse: &Spectrum,
    measurement_x: &[f64],
    measurements: &[Vec<f64>],
    iterations: usize,
    ground_truth_y: &[f64],
    validation_y: &[f64],
) -> PaxResult<WidthConvergence> {
    let mut solver: Box<dyn Deconvolver> = if width > 0.0 {
        Box::new(FisterDeconvolver::new(
            impulse,
            measurement_x,
            width,
            iterations,
            Some(ground_truth_y),
            Some(validation_y),
        )?)
    } else {
        Box::new(LucyRichardson::new(
            impulse,
            measurement_x,
            iterations,
            Some(ground_truth_y),
            Some(validation_y),
        )?)
    };
    solver.fit(measurements)?;

    let deconvolved = solver
        .deconvolved()
        .cloned()
        .ok_or_else(|| PaxError::InvalidOption {
            option: "regularizer_widths",
            reason: format!("width {width} fit produced no estimate"),
        })?;
    Ok(WidthConvergence {
        width,
        diagnostics: solver.diagnostics().to_vec(),
        deconvolved,
    })
}
