use super::CliError;
use anyhow::Context;
use pax_core::config::AnalysisConfig;
use pax_core::pipelines::{assess_convergence, run_grid};
use pax_core::store::{ParameterizationKey, ResultStore};
use std::path::PathBuf;
use tracing::info;

#[derive(clap::Args)]
pub(super) struct ParameterizationFlags {
    /// Base-10 exponent of the total detected-count budget
    #[arg(long)]
    exponent: f64,

    /// Source (RIXS) spectrum preset
    #[arg(long, default_value = "schlappa")]
    rixs: String,

    /// Broadening (photoemission) spectrum preset
    #[arg(long, default_value = "ag")]
    photoemission: String,
}

impl ParameterizationFlags {
    fn key(&self) -> ParameterizationKey {
        ParameterizationKey::new(self.exponent, self.rixs.clone(), self.photoemission.clone())
    }
}

#[derive(clap::Args)]
pub(super) struct StoreFlags {
    /// Directory holding stored result bundles
    #[arg(long, default_value = "results")]
    results_dir: PathBuf,
}

impl StoreFlags {
    fn store(&self) -> ResultStore {
        ResultStore::new(&self.results_dir)
    }
}

#[derive(clap::Args)]
pub(super) struct AnalysisFlags {
    /// Measurement-axis resolution in eV
    #[arg(long)]
    spacing: Option<f64>,

    /// Iteration budget per deconvolver fit
    #[arg(long)]
    iterations: Option<usize>,

    /// Number of simulated measurement replicates
    #[arg(long)]
    simulations: Option<usize>,

    /// Cross-validation fold count
    #[arg(long)]
    cv_fold: Option<usize>,

    /// Comma-separated regularizer widths in eV
    #[arg(long, value_delimiter = ',')]
    widths: Option<Vec<f64>>,

    /// Worker-pool size for the convergence fan-out
    #[arg(long)]
    workers: Option<usize>,

    /// Shot-noise generator seed
    #[arg(long)]
    seed: Option<u64>,
}

impl AnalysisFlags {
    fn into_config(self) -> AnalysisConfig {
        let defaults = AnalysisConfig::default();
        AnalysisConfig {
            energy_spacing: self.spacing.unwrap_or(defaults.energy_spacing),
            iterations: self.iterations.unwrap_or(defaults.iterations),
            simulations: self.simulations.unwrap_or(defaults.simulations),
            cv_fold: self.cv_fold.unwrap_or(defaults.cv_fold),
            regularizer_widths: self.widths.unwrap_or(defaults.regularizer_widths),
            workers: self.workers.unwrap_or(defaults.workers),
            seed: self.seed.unwrap_or(defaults.seed),
        }
    }
}

#[derive(clap::Args)]
pub(super) struct RunArgs {
    #[command(flatten)]
    parameterization: ParameterizationFlags,

    #[command(flatten)]
    store: StoreFlags,

    #[command(flatten)]
    analysis: AnalysisFlags,

    /// Write plot artifacts here instead of next to the result bundle
    #[arg(long)]
    artifacts: Option<PathBuf>,
}

#[derive(clap::Args)]
pub(super) struct AssessConvergenceArgs {
    #[command(flatten)]
    parameterization: ParameterizationFlags,

    #[command(flatten)]
    analysis: AnalysisFlags,

    /// JSON report output path
    #[arg(long, default_value = "convergence_report.json")]
    report: PathBuf,
}

#[derive(clap::Args)]
pub(super) struct DescribeArgs {
    #[command(flatten)]
    parameterization: ParameterizationFlags,

    #[command(flatten)]
    store: StoreFlags,
}

pub(super) fn run_command(args: RunArgs) -> Result<i32, CliError> {
    let key = args.parameterization.key();
    let store = args.store.store();
    let config = args.analysis.into_config();

    info!(
        exponent = key.count_exponent,
        rixs = %key.rixs_preset,
        photoemission = %key.photoemission_preset,
        simulations = config.simulations,
        "starting grid run"
    );
    let outcome =
        run_grid(&key, &config, &store, args.artifacts.as_deref()).map_err(CliError::Compute)?;

    let fitted = &outcome.bundle.deconvolver;
    println!(
        "Grid run complete: best width {} eV over {} candidates.",
        fitted.best_width,
        fitted.regularizer_widths.len()
    );
    println!("Result bundle: {}", outcome.bundle_path.display());
    for path in &outcome.artifact_paths {
        println!("Artifact: {}", path.display());
    }
    Ok(0)
}

pub(super) fn assess_convergence_command(args: AssessConvergenceArgs) -> Result<i32, CliError> {
    let key = args.parameterization.key();
    let config = args.analysis.into_config();

    info!(
        exponent = key.count_exponent,
        workers = config.workers,
        "starting convergence assessment"
    );
    let report = assess_convergence(
        key.count_exponent,
        &key.rixs_preset,
        &key.photoemission_preset,
        &config,
    )
    .map_err(CliError::Compute)?;

    for run in &report.runs {
        if let Some(last) = run.diagnostics.last() {
            println!(
                "width {:>10} eV: reconstruction error {:.6e} after {} iterations",
                run.width, last.reconstruction_error, last.iteration + 1
            );
        }
    }

    let serialized = serde_json::to_string_pretty(&report)
        .context("serialize convergence report")
        .map_err(CliError::Internal)?;
    std::fs::write(&args.report, serialized)
        .with_context(|| format!("write convergence report '{}'", args.report.display()))
        .map_err(CliError::Internal)?;
    println!("Convergence report: {}", args.report.display());
    Ok(0)
}

pub(super) fn describe_command(args: DescribeArgs) -> Result<i32, CliError> {
    let key = args.parameterization.key();
    let store = args.store.store();
    let summary = store.describe(&key).map_err(CliError::Compute)?;

    println!("Stored result: {}", store.path_for(&key).display());
    println!("  iterations:         {}", summary.iterations);
    println!("  cv_fold:            {}", summary.cv_fold);
    println!("  regularizer widths: {:?}", summary.regularizer_widths);
    println!(
        "  measurements:       {} replicates x {} points",
        summary.measurement_shape.0, summary.measurement_shape.1
    );
    Ok(0)
}
