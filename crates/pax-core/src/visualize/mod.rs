//! Plain-text plot artifacts for fitted runs.
//!
//! Every artifact is a column-oriented text file with a `# columns:` header
//! so external plotting tools can consume it without a schema.

use crate::deconvolution::FittedGrid;
use crate::domain::{PaxError, PaxResult};
use crate::spectrum::MeasurementSet;
use std::fs;
use std::path::{Path, PathBuf};

pub const PHOTOEMISSION_FIT_FILE: &str = "photoemission_fit.dat";
pub const CV_CURVE_FILE: &str = "cv_curve.dat";
pub const DECONVOLVED_FILE: &str = "deconvolved.dat";

fn format_column_f64(value: f64) -> String {
    format!("{value:>18.10e}")
}

fn normalize_text_artifact(content: &str) -> String {
    let mut normalized = content.replace("\r\n", "\n").replace('\r', "\n");
    if !normalized.is_empty() && !normalized.ends_with('\n') {
        normalized.push('\n');
    }
    normalized
}

pub fn write_text_artifact(path: &Path, content: &str) -> PaxResult<()> {
    fs::write(path, normalize_text_artifact(content)).map_err(|source| PaxError::Io {
        action: "write artifact",
        path: path.to_path_buf(),
        source,
    })
}

/// Mean measured replicate next to the re-convolved prediction of the
/// selected fit, point by point on the measurement axis.
pub fn render_photoemission_fit(measurements: &MeasurementSet, fitted: &FittedGrid) -> String {
    let mean = measurements.mean_replicate();
    let mut lines = Vec::with_capacity(mean.len() + 1);
    lines.push("# columns: kinetic_energy_eV mean_measured reconvolved_fit".to_string());
    for ((x, measured), predicted) in measurements
        .x
        .iter()
        .zip(&mean)
        .zip(&fitted.reconstruction)
    {
        lines.push(format!(
            "{} {} {}",
            format_column_f64(*x),
            format_column_f64(*measured),
            format_column_f64(*predicted)
        ));
    }
    lines.join("\n")
}

/// Cross-validation score per candidate width, with the selected width in
/// the header.
pub fn render_cv_curve(fitted: &FittedGrid) -> String {
    let mut lines = Vec::with_capacity(fitted.regularizer_widths.len() + 2);
    lines.push(format!("# best_width_eV: {}", fitted.best_width));
    lines.push("# columns: regularizer_width_eV cv_score".to_string());
    for (width, score) in fitted.regularizer_widths.iter().zip(&fitted.cv_scores) {
        lines.push(format!(
            "{} {}",
            format_column_f64(*width),
            format_column_f64(*score)
        ));
    }
    lines.join("\n")
}

pub fn render_deconvolved(fitted: &FittedGrid) -> String {
    let spectrum = &fitted.deconvolved;
    let mut lines = Vec::with_capacity(spectrum.len() + 1);
    lines.push("# columns: energy_loss_eV intensity".to_string());
    for (x, y) in spectrum.x().iter().zip(spectrum.y()) {
        lines.push(format!(
            "{} {}",
            format_column_f64(*x),
            format_column_f64(*y)
        ));
    }
    lines.join("\n")
}

/// Writes the three standard artifacts of a grid run into `output_dir` and
/// returns their paths in the order written.
pub fn write_grid_artifacts(
    output_dir: &Path,
    measurements: &MeasurementSet,
    fitted: &FittedGrid,
) -> PaxResult<Vec<PathBuf>> {
    fs::create_dir_all(output_dir).map_err(|source| PaxError::Io {
        action: "create artifact directory",
        path: output_dir.to_path_buf(),
        source,
    })?;

    let fit_path = output_dir.join(PHOTOEMISSION_FIT_FILE);
    write_text_artifact(&fit_path, &render_photoemission_fit(measurements, fitted))?;

    let cv_path = output_dir.join(CV_CURVE_FILE);
    write_text_artifact(&cv_path, &render_cv_curve(fitted))?;

    let deconvolved_path = output_dir.join(DECONVOLVED_FILE);
    write_text_artifact(&deconvolved_path, &render_deconvolved(fitted))?;

    Ok(vec![fit_path, cv_path, deconvolved_path])
}

#[cfg(test)]
mod tests {
    use super::{
        normalize_text_artifact, render_cv_curve, render_deconvolved, render_photoemission_fit,
        write_grid_artifacts,
    };
    use crate::deconvolution::FittedGrid;
    use crate::numerics::uniform_axis;
    use crate::spectrum::{MeasurementSet, Spectrum};
    use tempfile::TempDir;

    fn sample_fit() -> (MeasurementSet, FittedGrid) {
        let measurements = MeasurementSet {
            x: vec![410.0, 410.1],
            y: vec![vec![3.0, 4.0], vec![5.0, 2.0]],
        };
        let deconvolved = Spectrum::new(
            "deconvolved spectrum",
            uniform_axis(770.0, 0.1, 3),
            vec![1.0, 2.0, 1.0],
        )
        .expect("spectrum");
        let fitted = FittedGrid {
            iterations: 10,
            cv_fold: 2,
            regularizer_widths: vec![0.0, 0.01],
            cv_scores: vec![0.5, 0.3],
            best_width: 0.01,
            deconvolved,
            reconstruction: vec![3.9, 3.1],
        };
        (measurements, fitted)
    }

    #[test]
    fn normalization_converts_line_endings_and_appends_trailing_newline() {
        assert_eq!(normalize_text_artifact("a\r\nb\rc"), "a\nb\nc\n");
        assert_eq!(normalize_text_artifact(""), "");
    }

    #[test]
    fn photoemission_fit_pairs_the_mean_replicate_with_the_prediction() {
        let (measurements, fitted) = sample_fit();
        let rendered = render_photoemission_fit(&measurements, &fitted);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(
            lines[0],
            "# columns: kinetic_energy_eV mean_measured reconvolved_fit"
        );
        assert_eq!(lines.len(), 3);
        // mean of 3.0 and 5.0
        assert!(lines[1].contains("4.0000000000e0"));
    }

    #[test]
    fn cv_curve_reports_the_selected_width() {
        let (_, fitted) = sample_fit();
        let rendered = render_cv_curve(&fitted);
        assert!(rendered.starts_with("# best_width_eV: 0.01"));
        assert_eq!(rendered.lines().count(), 4);
    }

    #[test]
    fn deconvolved_artifact_has_one_row_per_estimate_point() {
        let (_, fitted) = sample_fit();
        let rendered = render_deconvolved(&fitted);
        assert_eq!(rendered.lines().count(), 4);
    }

    #[test]
    fn grid_artifacts_land_in_the_output_directory() {
        let temp = TempDir::new().expect("tempdir");
        let (measurements, fitted) = sample_fit();
        let paths =
            write_grid_artifacts(temp.path(), &measurements, &fitted).expect("write artifacts");
        assert_eq!(paths.len(), 3);
        for path in &paths {
            assert!(path.is_file());
            let content = std::fs::read_to_string(path).expect("read");
            assert!(content.ends_with('\n'));
        }
    }
}
