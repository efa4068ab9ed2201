//! Model source ("RIXS") spectra.

use crate::domain::{PaxError, PaxResult};
use crate::numerics::uniform_axis_over;
use crate::spectrum::Spectrum;

/// Gaussian line centered at `center` with standard deviation `sigma`.
fn gaussian(x: f64, center: f64, sigma: f64) -> f64 {
    let z = (x - center) / sigma;
    (-0.5 * z * z).exp()
}

/// Lorentzian line centered at `center` with half-width `gamma`.
fn lorentzian(x: f64, center: f64, gamma: f64) -> f64 {
    let z = (x - center) / gamma;
    1.0 / (1.0 + z * z)
}

/// Cu L3 Sr2CuO3-like model: elastic line, dd excitations, and a broad
/// charge-transfer feature on a photon-energy axis near 778 eV.
/// (amplitude, center / eV, sigma / eV)
const SCHLAPPA_PEAKS: [(f64, f64, f64); 5] = [
    (0.2, 777.75, 0.04),
    (1.0, 776.20, 0.10),
    (0.8, 775.80, 0.12),
    (0.4, 775.20, 0.15),
    (0.15, 772.30, 0.50),
];

const SCHLAPPA_WINDOW: (f64, f64) = (770.0, 778.0);

/// Synthetic resolution probe: two narrow Lorentzians 1 eV apart.
const DOUBLET_PEAKS: [(f64, f64, f64); 2] = [(1.0, 776.0, 0.02), (0.5, 777.0, 0.02)];

const DOUBLET_WINDOW: (f64, f64) = (774.0, 778.0);

/// Resolve a named source preset at the requested axis spacing.
pub fn resolve_source(name: &str, energy_spacing: f64) -> PaxResult<Spectrum> {
    if !energy_spacing.is_finite() || energy_spacing <= 0.0 {
        return Err(PaxError::InvalidOption {
            option: "energy_spacing",
            reason: format!("must be finite and > 0, got {energy_spacing}"),
        });
    }

    match name {
        "schlappa" => {
            build_gaussian_preset(SCHLAPPA_WINDOW, &SCHLAPPA_PEAKS, energy_spacing)
        }
        "doublet" => build_lorentzian_preset(DOUBLET_WINDOW, &DOUBLET_PEAKS, energy_spacing),
        other => Err(PaxError::UnknownSourcePreset {
            name: other.to_string(),
        }),
    }
}

fn build_gaussian_preset(
    window: (f64, f64),
    peaks: &[(f64, f64, f64)],
    spacing: f64,
) -> PaxResult<Spectrum> {
    let x = uniform_axis_over(window.0, window.1, spacing);
    let y = x
        .iter()
        .map(|&energy| {
            peaks
                .iter()
                .map(|&(amplitude, center, sigma)| amplitude * gaussian(energy, center, sigma))
                .sum()
        })
        .collect();
    Spectrum::new("source spectrum", x, y)
}

fn build_lorentzian_preset(
    window: (f64, f64),
    peaks: &[(f64, f64, f64)],
    spacing: f64,
) -> PaxResult<Spectrum> {
    let x = uniform_axis_over(window.0, window.1, spacing);
    let y = x
        .iter()
        .map(|&energy| {
            peaks
                .iter()
                .map(|&(amplitude, center, gamma)| amplitude * lorentzian(energy, center, gamma))
                .sum()
        })
        .collect();
    Spectrum::new("source spectrum", x, y)
}
