//! Simulation and recovery of photoemission-analyzed X-ray (PAX) spectra.
//!
//! The crate models a PAX measurement as the convolution of a soft X-ray
//! emission spectrum with the flipped, normalized photoemission spectrum of
//! a converter, injects calibrated shot noise, and recovers the emission
//! spectrum with regularized Richardson-Lucy deconvolution selected by
//! cross-validation.

pub mod config;
pub mod deconvolution;
pub mod domain;
pub mod numerics;
pub mod pipelines;
pub mod presets;
pub mod simulation;
pub mod spectrum;
pub mod store;
pub mod visualize;

pub use config::AnalysisConfig;
pub use domain::{PaxError, PaxErrorCategory, PaxResult};
pub use spectrum::{MeasurementSet, Spectrum};
