//! Model broadening ("photoemission") spectra.
//!
//! Broadening presets are built on a binding-energy axis at the reference
//! axis' spacing. The preset window must strictly contain the reference
//! span so the valid-mode convolution yields a non-trivial measurement.

use crate::domain::{PaxError, PaxResult};
use crate::numerics::uniform_axis_over;
use crate::spectrum::{Spectrum, uniform_spacing_of};

/// Ag 3d doublet: (amplitude, binding energy / eV, Lorentzian half-width / eV).
const AG_3D_PEAKS: [(f64, f64, f64); 2] = [(1.5, 368.3, 0.25), (1.0, 374.4, 0.28)];

const AG_WINDOW: (f64, f64) = (355.0, 390.0);
const AG_BACKGROUND: f64 = 0.01;

const FERMI_WINDOW: (f64, f64) = (-2.0, 30.0);
const FERMI_TEMPERATURE_EV: f64 = 0.1;

/// Resolve a named broadening preset against the measurement reference axis.
pub fn resolve_broadening(name: &str, reference_axis: &[f64]) -> PaxResult<Spectrum> {
    let spacing = uniform_spacing_of("reference axis", reference_axis)?;

    let spectrum = match name {
        "ag" => build_ag(spacing)?,
        "fermi" => build_fermi(spacing)?,
        other => {
            return Err(PaxError::UnknownBroadeningPreset {
                name: other.to_string(),
            });
        }
    };

    if spectrum.len() <= reference_axis.len() {
        return Err(PaxError::BroadeningTooShort {
            broadening_len: spectrum.len(),
            source_len: reference_axis.len(),
        });
    }
    Ok(spectrum)
}

fn build_ag(spacing: f64) -> PaxResult<Spectrum> {
    let x = uniform_axis_over(AG_WINDOW.0, AG_WINDOW.1, spacing);
    let y = x
        .iter()
        .map(|&binding_energy| {
            let peaks: f64 = AG_3D_PEAKS
                .iter()
                .map(|&(amplitude, center, gamma)| {
                    let z = (binding_energy - center) / gamma;
                    amplitude / (1.0 + z * z)
                })
                .sum();
            peaks + AG_BACKGROUND
        })
        .collect();
    Spectrum::new("photoemission spectrum", x, y)
}

/// Thermally broadened Fermi edge at zero binding energy.
fn build_fermi(spacing: f64) -> PaxResult<Spectrum> {
    let x = uniform_axis_over(FERMI_WINDOW.0, FERMI_WINDOW.1, spacing);
    let y = x
        .iter()
        .map(|&binding_energy| 1.0 / (1.0 + (-binding_energy / FERMI_TEMPERATURE_EV).exp()))
        .collect();
    Spectrum::new("photoemission spectrum", x, y)
}
