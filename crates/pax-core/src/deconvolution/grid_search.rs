//! Cross-validated regularizer-width selection.

use super::lucy::{SingleDeconvolver, mean_squared_error};
use super::{Deconvolver, IterationDiagnostic};
use crate::domain::{PaxError, PaxResult};
use crate::numerics::convolve_valid;
use crate::spectrum::Spectrum;
use serde::{Deserialize, Serialize};

/// Serializable outcome of a grid fit, decoupled from solver internals so
/// persisted bundles survive solver changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedGrid {
    pub iterations: usize,
    pub cv_fold: usize,
    pub regularizer_widths: Vec<f64>,
    /// Mean held-out reconstruction MSE per candidate width.
    pub cv_scores: Vec<f64>,
    pub best_width: f64,
    pub deconvolved: Spectrum,
    /// Re-convolved prediction of the selected fit on the measurement axis.
    pub reconstruction: Vec<f64>,
}

/// Grid-search deconvolver: k-fold cross-validation over a width grid,
/// then a refit of the winning width on the full replicate matrix.
#[derive(Debug)]
pub struct FisterGrid {
    impulse: Spectrum,
    measurement_x: Vec<f64>,
    regularizer_widths: Vec<f64>,
    iterations: usize,
    ground_truth_y: Option<Vec<f64>>,
    cv_fold: usize,
    diagnostics: Vec<IterationDiagnostic>,
    fitted: Option<FittedGrid>,
}

impl FisterGrid {
    pub fn new(
        impulse: &Spectrum,
        measurement_x: &[f64],
        regularizer_widths: &[f64],
        iterations: usize,
        ground_truth_y: Option<&[f64]>,
        cv_fold: usize,
    ) -> PaxResult<Self> {
        // construct once to validate geometry and option values up front
        SingleDeconvolver::new(
            impulse,
            measurement_x,
            iterations,
            None,
            ground_truth_y,
            None,
        )?;
        if cv_fold < 2 {
            return Err(PaxError::InvalidOption {
                option: "cv_fold",
                reason: format!("must be at least 2, got {cv_fold}"),
            });
        }
        if regularizer_widths.is_empty() {
            return Err(PaxError::InvalidOption {
                option: "regularizer_widths",
                reason: "grid must not be empty".to_string(),
            });
        }
        for &width in regularizer_widths {
            if !width.is_finite() || width < 0.0 {
                return Err(PaxError::InvalidOption {
                    option: "regularizer_widths",
                    reason: format!("widths must be finite and >= 0, got {width}"),
                });
            }
        }

        Ok(Self {
            impulse: impulse.clone(),
            measurement_x: measurement_x.to_vec(),
            regularizer_widths: regularizer_widths.to_vec(),
            iterations,
            ground_truth_y: ground_truth_y.map(<[f64]>::to_vec),
            cv_fold,
            diagnostics: Vec::new(),
            fitted: None,
        })
    }

    pub fn fitted(&self) -> Option<&FittedGrid> {
        self.fitted.as_ref()
    }

    /// Fit one single-width solver; a width of zero selects the
    /// unregularized variant.
    fn fit_single(
        &self,
        width: f64,
        rows: &[Vec<f64>],
        with_ground_truth: bool,
    ) -> PaxResult<SingleDeconvolver> {
        let ground_truth = if with_ground_truth {
            self.ground_truth_y.as_deref()
        } else {
            None
        };
        let mut solver = SingleDeconvolver::new(
            &self.impulse,
            &self.measurement_x,
            self.iterations,
            (width > 0.0).then_some(width),
            ground_truth,
            None,
        )?;
        solver.fit(rows)?;
        Ok(solver)
    }

    fn cross_validation_score(&self, width: f64, folds: &[Vec<Vec<f64>>]) -> PaxResult<f64> {
        let mut total = 0.0;
        for held_out_index in 0..folds.len() {
            let training_rows: Vec<Vec<f64>> = folds
                .iter()
                .enumerate()
                .filter(|(index, _)| *index != held_out_index)
                .flat_map(|(_, fold)| fold.iter().cloned())
                .collect();
            let solver = self.fit_single(width, &training_rows, false)?;
            let estimate = solver
                .deconvolved
                .as_ref()
                .ok_or_else(|| PaxError::InvalidOption {
                    option: "regularizer_widths",
                    reason: "fold fit produced no estimate".to_string(),
                })?;

            let prediction = convolve_valid(self.impulse.y(), estimate.y());
            let held_out_mean =
                super::mean_measurement(&folds[held_out_index], self.measurement_x.len())?;
            total += mean_squared_error(&prediction, &held_out_mean);
        }
        Ok(total / folds.len() as f64)
    }
}

impl Deconvolver for FisterGrid {
    fn fit(&mut self, measurements: &[Vec<f64>]) -> PaxResult<()> {
        if measurements.len() < self.cv_fold {
            return Err(PaxError::InvalidOption {
                option: "cv_fold",
                reason: format!(
                    "{} folds need at least as many replicates, got {}",
                    self.cv_fold,
                    measurements.len()
                ),
            });
        }

        // exactly cv_fold contiguous folds of near-equal size
        let base = measurements.len() / self.cv_fold;
        let remainder = measurements.len() % self.cv_fold;
        let mut folds: Vec<Vec<Vec<f64>>> = Vec::with_capacity(self.cv_fold);
        let mut offset = 0;
        for fold_index in 0..self.cv_fold {
            let size = base + usize::from(fold_index < remainder);
            folds.push(measurements[offset..offset + size].to_vec());
            offset += size;
        }

        let mut cv_scores = Vec::with_capacity(self.regularizer_widths.len());
        for &width in &self.regularizer_widths {
            cv_scores.push(self.cross_validation_score(width, &folds)?);
        }

        let best_index = cv_scores
            .iter()
            .enumerate()
            .min_by(|a, b| a.1.total_cmp(b.1))
            .map(|(index, _)| index)
            .unwrap_or(0);
        let best_width = self.regularizer_widths[best_index];

        let solver = self.fit_single(best_width, measurements, true)?;
        let deconvolved = solver
            .deconvolved
            .clone()
            .ok_or_else(|| PaxError::InvalidOption {
                option: "regularizer_widths",
                reason: "final fit produced no estimate".to_string(),
            })?;
        let reconstruction = convolve_valid(self.impulse.y(), deconvolved.y());

        self.diagnostics = solver.diagnostics;
        self.fitted = Some(FittedGrid {
            iterations: self.iterations,
            cv_fold: self.cv_fold,
            regularizer_widths: self.regularizer_widths.clone(),
            cv_scores,
            best_width,
            deconvolved,
            reconstruction,
        });
        Ok(())
    }

    fn deconvolved(&self) -> Option<&Spectrum> {
        self.fitted.as_ref().map(|fitted| &fitted.deconvolved)
    }

    fn diagnostics(&self) -> &[IterationDiagnostic] {
        &self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::{Deconvolver, FisterGrid};
    use crate::domain::PaxError;
    use crate::numerics::{convolve_valid, gaussian_kernel, uniform_axis};
    use crate::simulation::simulate;
    use crate::spectrum::Spectrum;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn noisy_problem(replicates: usize) -> (Spectrum, Vec<f64>, Vec<Vec<f64>>) {
        let kernel_y = gaussian_kernel(0.04, 0.01);
        let photoemission_x = uniform_axis(360.0, 0.01, kernel_y.len());
        let photoemission =
            Spectrum::new("photoemission spectrum", photoemission_x, kernel_y).expect("pe");

        let source_len = photoemission.len() - 12;
        let mut source_y = vec![0.0; source_len];
        source_y[source_len / 2] = 1.0;
        let source_x = uniform_axis(770.0, 0.01, source_len);
        let source = Spectrum::new("source spectrum", source_x, source_y).expect("source");

        let mut rng = StdRng::seed_from_u64(11);
        let (impulse, measurements) =
            simulate(&source, &photoemission, 1.0e5, replicates, &mut rng).expect("simulation");
        (impulse, measurements.x, measurements.y)
    }

    #[test]
    fn grid_fit_scores_every_width_and_selects_one_of_them() {
        let (impulse, measurement_x, rows) = noisy_problem(4);
        let widths = [0.0, 0.02, 0.08];
        let mut grid =
            FisterGrid::new(&impulse, &measurement_x, &widths, 15, None, 2).expect("grid");
        grid.fit(&rows).expect("fit");

        let fitted = grid.fitted().expect("fitted state");
        assert_eq!(fitted.cv_scores.len(), widths.len());
        assert!(widths.contains(&fitted.best_width));
        assert!(fitted.cv_scores.iter().all(|score| score.is_finite()));
        assert_eq!(fitted.reconstruction.len(), measurement_x.len());
        assert_eq!(grid.diagnostics().len(), 15);
    }

    #[test]
    fn too_few_replicates_for_the_fold_count_is_rejected() {
        let (impulse, measurement_x, rows) = noisy_problem(2);
        let mut grid =
            FisterGrid::new(&impulse, &measurement_x, &[0.01], 5, None, 4).expect("grid");
        let error = grid.fit(&rows).expect_err("2 rows cannot fill 4 folds");
        assert!(matches!(
            error,
            PaxError::InvalidOption {
                option: "cv_fold",
                ..
            }
        ));
    }

    #[test]
    fn empty_width_grid_is_rejected_at_construction() {
        let (impulse, measurement_x, _) = noisy_problem(2);
        let error = FisterGrid::new(&impulse, &measurement_x, &[], 5, None, 2)
            .expect_err("empty grid should fail");
        assert!(matches!(
            error,
            PaxError::InvalidOption {
                option: "regularizer_widths",
                ..
            }
        ));
    }

    #[test]
    fn reconstruction_matches_reconvolved_estimate() {
        let (impulse, measurement_x, rows) = noisy_problem(4);
        let mut grid =
            FisterGrid::new(&impulse, &measurement_x, &[0.03], 10, None, 2).expect("grid");
        grid.fit(&rows).expect("fit");

        let fitted = grid.fitted().expect("fitted state");
        let expected = convolve_valid(impulse.y(), fitted.deconvolved.y());
        assert_eq!(fitted.reconstruction, expected);
    }
}
