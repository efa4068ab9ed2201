use std::path::PathBuf;

pub type PaxResult<T> = Result<T, PaxError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaxErrorCategory {
    Configuration,
    InvalidInput,
    NotFound,
    Io,
}

impl PaxErrorCategory {
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::Configuration => 2,
            Self::InvalidInput => 3,
            Self::NotFound => 4,
            Self::Io => 5,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Configuration => "ConfigurationError",
            Self::InvalidInput => "InvalidInputError",
            Self::NotFound => "NotFoundError",
            Self::Io => "IoError",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PaxError {
    #[error("unrecognized source preset '{name}'")]
    UnknownSourcePreset { name: String },
    #[error("unrecognized broadening preset '{name}'")]
    UnknownBroadeningPreset { name: String },
    #[error("configuration option '{option}' is invalid: {reason}")]
    InvalidOption { option: &'static str, reason: String },
    #[error("invalid {context}: intensity must not be all zero")]
    ZeroIntensity { context: &'static str },
    #[error("invalid {context}: predicted measurement has zero total intensity")]
    ZeroPredictedCounts { context: &'static str },
    #[error(
        "invalid {context}: axis must be strictly increasing, index {index} has {current} after {previous}"
    )]
    NonMonotonicAxis {
        context: &'static str,
        index: usize,
        previous: f64,
        current: f64,
    },
    #[error(
        "invalid {context}: axis spacing must be uniform, index {index} has step {actual} against {expected}"
    )]
    NonUniformSpacing {
        context: &'static str,
        index: usize,
        expected: f64,
        actual: f64,
    },
    #[error("invalid {context}: axis has {x_len} points but intensity has {y_len}")]
    LengthMismatch {
        context: &'static str,
        x_len: usize,
        y_len: usize,
    },
    #[error("invalid {context}: spectrum must have at least {minimum} points, got {actual}")]
    TooFewPoints {
        context: &'static str,
        minimum: usize,
        actual: usize,
    },
    #[error("invalid {context}: value must be finite and non-negative at index {index}, got {value}")]
    InvalidIntensity {
        context: &'static str,
        index: usize,
        value: f64,
    },
    #[error(
        "broadening spectrum ({broadening_len} points) must span the source spectrum ({source_len} points)"
    )]
    BroadeningTooShort {
        broadening_len: usize,
        source_len: usize,
    },
    #[error("invalid {context}: value must be finite, got {value}")]
    NonFiniteValue { context: &'static str, value: f64 },
    #[error("no stored result at '{}'", path.display())]
    MissingResult { path: PathBuf },
    #[error("failed to {action} '{}': {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(
        "stored bundle '{}' has schema version {found}, this build supports {supported}",
        path.display()
    )]
    UnsupportedSchema {
        path: PathBuf,
        found: u32,
        supported: u32,
    },
    #[error("failed to {action} result bundle '{}': {source}", path.display())]
    Serialization {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl PaxError {
    pub const fn category(&self) -> PaxErrorCategory {
        match self {
            Self::UnknownSourcePreset { .. }
            | Self::UnknownBroadeningPreset { .. }
            | Self::InvalidOption { .. } => PaxErrorCategory::Configuration,
            Self::ZeroIntensity { .. }
            | Self::ZeroPredictedCounts { .. }
            | Self::NonMonotonicAxis { .. }
            | Self::NonUniformSpacing { .. }
            | Self::LengthMismatch { .. }
            | Self::TooFewPoints { .. }
            | Self::InvalidIntensity { .. }
            | Self::NonFiniteValue { .. }
            | Self::BroadeningTooShort { .. } => PaxErrorCategory::InvalidInput,
            Self::MissingResult { .. } => PaxErrorCategory::NotFound,
            Self::Io { .. } | Self::Serialization { .. } | Self::UnsupportedSchema { .. } => {
                PaxErrorCategory::Io
            }
        }
    }

    pub const fn exit_code(&self) -> i32 {
        self.category().exit_code()
    }

    pub fn diagnostic_line(&self) -> String {
        format!("ERROR: [{}] {}", self.category().as_str(), self)
    }
}

#[cfg(test)]
mod tests {
    use super::{PaxError, PaxErrorCategory};

    #[test]
    fn taxonomy_exit_mapping_is_stable() {
        let cases = [
            (PaxErrorCategory::Configuration, 2, "ConfigurationError"),
            (PaxErrorCategory::InvalidInput, 3, "InvalidInputError"),
            (PaxErrorCategory::NotFound, 4, "NotFoundError"),
            (PaxErrorCategory::Io, 5, "IoError"),
        ];

        for (category, exit_code, name) in cases {
            assert_eq!(category.exit_code(), exit_code);
            assert_eq!(category.as_str(), name);
        }
    }

    #[test]
    fn unknown_preset_renders_category_and_name() {
        let error = PaxError::UnknownSourcePreset {
            name: "mystery".to_string(),
        };

        assert_eq!(error.category(), PaxErrorCategory::Configuration);
        assert_eq!(error.exit_code(), 2);
        assert_eq!(
            error.diagnostic_line(),
            "ERROR: [ConfigurationError] unrecognized source preset 'mystery'"
        );
    }

    #[test]
    fn degenerate_spectrum_errors_are_invalid_input() {
        let error = PaxError::ZeroIntensity {
            context: "photoemission spectrum",
        };
        assert_eq!(error.category(), PaxErrorCategory::InvalidInput);
        assert_eq!(error.exit_code(), 3);
    }
}
