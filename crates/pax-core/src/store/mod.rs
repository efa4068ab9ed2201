//! Persistence of fitted-result bundles.
//!
//! One file per parameterization key; a repeated save with the same key
//! overwrites silently (documented, last writer wins). Bundles carry an
//! explicit schema version so stored results and solver internals can
//! evolve independently.

use crate::deconvolution::FittedGrid;
use crate::domain::{PaxError, PaxResult};
use crate::spectrum::MeasurementSet;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const RESULT_SCHEMA_VERSION: u32 = 1;

/// The triple that deterministically identifies one persisted result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterizationKey {
    pub count_exponent: f64,
    pub rixs_preset: String,
    pub photoemission_preset: String,
}

impl ParameterizationKey {
    pub fn new(
        count_exponent: f64,
        rixs_preset: impl Into<String>,
        photoemission_preset: impl Into<String>,
    ) -> Self {
        Self {
            count_exponent,
            rixs_preset: rixs_preset.into(),
            photoemission_preset: photoemission_preset.into(),
        }
    }

    /// `{photoemission}_{rixs}_rixs_1E{exponent}.json`; integral exponents
    /// drop the decimal point.
    pub fn file_name(&self) -> String {
        format!(
            "{}_{}_rixs_1E{}.json",
            self.photoemission_preset,
            self.rixs_preset,
            format_exponent(self.count_exponent)
        )
    }
}

fn format_exponent(exponent: f64) -> String {
    if exponent.fract() == 0.0 {
        format!("{}", exponent as i64)
    } else {
        format!("{exponent}")
    }
}

/// Fitted grid state plus the measurement set it was fit against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedResultBundle {
    pub schema_version: u32,
    pub deconvolver: FittedGrid,
    pub pax_spectra: MeasurementSet,
}

/// Small projection of a stored bundle for parameter printing; exposes no
/// solver internals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredRunSummary {
    pub iterations: usize,
    pub cv_fold: usize,
    pub regularizer_widths: Vec<f64>,
    /// (replicates, measurement-axis length)
    pub measurement_shape: (usize, usize),
}

#[derive(Debug, Clone)]
pub struct ResultStore {
    results_dir: PathBuf,
}

impl ResultStore {
    pub fn new(results_dir: impl Into<PathBuf>) -> Self {
        Self {
            results_dir: results_dir.into(),
        }
    }

    pub fn results_dir(&self) -> &Path {
        &self.results_dir
    }

    /// Pure derivation of the on-disk location for a key.
    pub fn path_for(&self, key: &ParameterizationKey) -> PathBuf {
        self.results_dir.join(key.file_name())
    }

    pub fn save(&self, bundle: &FittedResultBundle, key: &ParameterizationKey) -> PaxResult<PathBuf> {
        fs::create_dir_all(&self.results_dir).map_err(|source| PaxError::Io {
            action: "create results directory",
            path: self.results_dir.clone(),
            source,
        })?;

        let path = self.path_for(key);
        let serialized =
            serde_json::to_string(bundle).map_err(|source| PaxError::Serialization {
                action: "serialize",
                path: path.clone(),
                source,
            })?;
        fs::write(&path, serialized).map_err(|source| PaxError::Io {
            action: "write",
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }

    pub fn load(&self, key: &ParameterizationKey) -> PaxResult<FittedResultBundle> {
        let path = self.path_for(key);
        let source = match fs::read_to_string(&path) {
            Ok(source) => source,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                return Err(PaxError::MissingResult { path });
            }
            Err(source) => {
                return Err(PaxError::Io {
                    action: "read",
                    path,
                    source,
                });
            }
        };

        let bundle: FittedResultBundle =
            serde_json::from_str(&source).map_err(|source| PaxError::Serialization {
                action: "deserialize",
                path: path.clone(),
                source,
            })?;
        if bundle.schema_version != RESULT_SCHEMA_VERSION {
            return Err(PaxError::UnsupportedSchema {
                path,
                found: bundle.schema_version,
                supported: RESULT_SCHEMA_VERSION,
            });
        }
        Ok(bundle)
    }

    pub fn describe(&self, key: &ParameterizationKey) -> PaxResult<StoredRunSummary> {
        let bundle = self.load(key)?;
        Ok(StoredRunSummary {
            iterations: bundle.deconvolver.iterations,
            cv_fold: bundle.deconvolver.cv_fold,
            regularizer_widths: bundle.deconvolver.regularizer_widths.clone(),
            measurement_shape: bundle.pax_spectra.shape(),
        })
    }
}
