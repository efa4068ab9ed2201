//! End-to-end simulate-then-recover checks on the bundled presets.

use pax_core::config::AnalysisConfig;
use pax_core::deconvolution::{Deconvolver, FisterGrid};
use pax_core::pipelines::{assess_convergence, run_grid};
use pax_core::simulation::simulate_from_presets;
use pax_core::store::{ParameterizationKey, ResultStore};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tempfile::TempDir;

const TEST_SPACING: f64 = 0.02;

#[test]
fn schlappa_ag_measurement_axis_follows_the_convolution_contract() {
    let mut rng = StdRng::seed_from_u64(11);
    let (impulse, measurements, xray) =
        simulate_from_presets(10.0, "schlappa", "ag", 3, TEST_SPACING, &mut rng)
            .expect("simulation");

    // schlappa window starts at 770 eV, ag window at 355 eV
    assert!((measurements.x[0] - 415.0).abs() < 1e-9);
    assert_eq!(
        measurements.x.len(),
        impulse.len() - xray.len() + 1,
        "valid-mode convolution length"
    );
    for replicate in &measurements.y {
        assert_eq!(replicate.len(), measurements.x.len());
    }
}

#[test]
fn grid_recovery_localizes_the_dominant_emission_line() {
    let mut rng = StdRng::seed_from_u64(19);
    let (impulse, measurements, xray) =
        simulate_from_presets(10.0, "schlappa", "ag", 4, TEST_SPACING, &mut rng)
            .expect("simulation");

    let mut grid = FisterGrid::new(
        &impulse,
        &measurements.x,
        &[0.01, 0.04],
        30,
        Some(xray.y()),
        2,
    )
    .expect("grid construction");
    grid.fit(&measurements.y).expect("grid fit");
    let fitted = grid.fitted().expect("fitted state");

    let deconvolved = &fitted.deconvolved;
    assert_eq!(deconvolved.len(), xray.len());
    for (estimate, truth) in deconvolved.x().iter().zip(xray.x()) {
        assert!((estimate - truth).abs() < 1e-6, "estimate axis matches the source");
    }

    let peak_index = deconvolved
        .y()
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map(|(index, _)| index)
        .unwrap();
    let peak_energy = deconvolved.x()[peak_index];
    // strongest schlappa line sits at 776.2 eV
    assert!(
        (peak_energy - 776.2).abs() < 0.3,
        "dominant line recovered at {peak_energy} eV"
    );

    let diagnostics = grid.diagnostics();
    assert_eq!(diagnostics.len(), 30);
    let first = diagnostics.first().unwrap();
    let last = diagnostics.last().unwrap();
    assert!(
        last.reconstruction_error < first.reconstruction_error,
        "reconstruction error should shrink over iterations"
    );
}

#[test]
fn grid_pipeline_persists_a_reloadable_bundle() {
    let temp = TempDir::new().expect("tempdir should be created");
    let store = ResultStore::new(temp.path());
    let key = ParameterizationKey::new(8.0, "schlappa", "ag");
    let config = AnalysisConfig {
        energy_spacing: TEST_SPACING,
        iterations: 10,
        simulations: 6,
        cv_fold: 3,
        regularizer_widths: vec![0.0, 0.02],
        ..AnalysisConfig::default()
    };

    let outcome = run_grid(&key, &config, &store, None).expect("grid run");
    assert_eq!(
        outcome.bundle_path.file_name().and_then(|name| name.to_str()),
        Some("ag_schlappa_rixs_1E8.json")
    );

    let reloaded = store.load(&key).expect("reload");
    assert_eq!(reloaded.pax_spectra.shape().0, 6);
    assert_eq!(
        reloaded.deconvolver.regularizer_widths,
        config.regularizer_widths
    );
    assert!(
        config
            .regularizer_widths
            .contains(&reloaded.deconvolver.best_width),
        "selected width comes from the candidate grid"
    );
}

#[test]
fn convergence_assessment_scores_against_a_weaker_validation_set() {
    let config = AnalysisConfig {
        energy_spacing: TEST_SPACING,
        iterations: 4,
        simulations: 3,
        regularizer_widths: vec![0.03],
        ..AnalysisConfig::default()
    };

    let report = assess_convergence(7.0, "doublet", "ag", &config).expect("convergence");
    assert!((report.validation_exponent - 6.67).abs() < 1e-9);
    assert_eq!(report.runs.len(), 2);
    assert_eq!(report.runs[0].width, 0.0);
    assert_eq!(report.runs[1].width, 0.03);
    for run in &report.runs {
        assert_eq!(run.diagnostics.len(), 4);
        assert!(run.diagnostics.iter().all(|d| d.validation_error.is_some()));
    }
}
