//! PAX measurement model: impulse response, noiseless convolution, and
//! calibrated Poisson noise.

use crate::domain::{PaxError, PaxResult};
use crate::numerics::{convolve_valid, uniform_axis};
use crate::presets;
use crate::spectrum::{MeasurementSet, Spectrum};
use rand::Rng;
use rand_distr::{Distribution, Poisson};

/// Normalize and flip a photoemission spectrum into a unit-area convolution
/// kernel. The axis is negated without reordering, so the impulse-response
/// axis decreases while its intensities are reversed.
pub fn impulse_response(photoemission: &Spectrum) -> PaxResult<Spectrum> {
    photoemission.validate_intensity("photoemission spectrum")?;

    let x = photoemission.x().iter().map(|&value| -value).collect();
    let norm = photoemission.total_intensity();
    let y = photoemission
        .y()
        .iter()
        .rev()
        .map(|&value| value / norm)
        .collect();
    Spectrum::new("impulse response", x, y)
}

/// Kinetic-energy axis of the simulated measurement.
///
/// First point `xray.x[0] - photoemission.x[0]`, the source spacing, and
/// exactly `len(photoemission) - len(xray) + 1` points.
pub fn measurement_axis(xray: &Spectrum, photoemission: &Spectrum) -> PaxResult<Vec<f64>> {
    let spacing = xray.uniform_spacing("source spectrum")?;
    if photoemission.len() <= xray.len() {
        return Err(PaxError::BroadeningTooShort {
            broadening_len: photoemission.len(),
            source_len: xray.len(),
        });
    }

    let first_point = xray.x()[0] - photoemission.x()[0];
    let length = photoemission.len() - xray.len() + 1;
    Ok(uniform_axis(first_point, spacing, length))
}

/// Simulate PAX spectra: convolve the source with the impulse response,
/// share the `counts` budget across replicates, and draw independent
/// shot-noise realizations.
pub fn simulate<R: Rng>(
    xray: &Spectrum,
    photoemission: &Spectrum,
    counts: f64,
    num_simulations: usize,
    rng: &mut R,
) -> PaxResult<(Spectrum, MeasurementSet)> {
    if !counts.is_finite() || counts <= 0.0 {
        return Err(PaxError::InvalidOption {
            option: "counts",
            reason: format!("must be finite and > 0, got {counts}"),
        });
    }
    if num_simulations == 0 {
        return Err(PaxError::InvalidOption {
            option: "simulations",
            reason: "must be at least 1".to_string(),
        });
    }
    xray.validate_intensity("source spectrum")?;

    let axis = measurement_axis(xray, photoemission)?;
    let response = impulse_response(photoemission)?;
    let noiseless = convolve_valid(xray.y(), response.y());
    debug_assert_eq!(noiseless.len(), axis.len());

    let total: f64 = noiseless.iter().sum();
    if total == 0.0 {
        return Err(PaxError::ZeroPredictedCounts {
            context: "simulated measurement",
        });
    }

    // Raw intensity units per detected photon once the count budget is
    // shared across replicates.
    let single_photon = num_simulations as f64 * total / counts;

    let mut realizations = Vec::with_capacity(num_simulations);
    for _ in 0..num_simulations {
        realizations.push(apply_poisson_noise(&noiseless, single_photon, rng)?);
    }

    Ok((
        response,
        MeasurementSet {
            x: axis,
            y: realizations,
        },
    ))
}

/// Resolve presets, then simulate at `10^exponent` total counts.
///
/// The resolved source curve is returned alongside the simulation so
/// downstream consumers can score recovery against ground truth.
pub fn simulate_from_presets<R: Rng>(
    count_exponent: f64,
    rixs_preset: &str,
    photoemission_preset: &str,
    num_simulations: usize,
    energy_spacing: f64,
    rng: &mut R,
) -> PaxResult<(Spectrum, MeasurementSet, Spectrum)> {
    let counts = 10.0_f64.powf(count_exponent);
    let xray = presets::resolve_source(rixs_preset, energy_spacing)?;
    let photoemission = presets::resolve_broadening(photoemission_preset, xray.x())?;
    let (response, measurements) = simulate(&xray, &photoemission, counts, num_simulations, rng)?;
    Ok((response, measurements, xray))
}

/// Shot noise at photon-counting resolution, rescaled back to intensity
/// units. Every element is an independent draw.
fn apply_poisson_noise<R: Rng>(
    noiseless: &[f64],
    single_photon: f64,
    rng: &mut R,
) -> PaxResult<Vec<f64>> {
    let mut output = Vec::with_capacity(noiseless.len());
    for &value in noiseless {
        let mean = value / single_photon;
        if !mean.is_finite() {
            return Err(PaxError::NonFiniteValue {
                context: "poisson mean",
                value: mean,
            });
        }
        let photons = if mean > 0.0 {
            Poisson::new(mean)
                .map_err(|_| PaxError::NonFiniteValue {
                    context: "poisson mean",
                    value: mean,
                })?
                .sample(rng)
        } else {
            0.0
        };
        output.push(photons * single_photon);
    }
    Ok(output)
}
