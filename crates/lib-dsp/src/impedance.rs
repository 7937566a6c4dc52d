//! Surface impedance of a one-dimensional layered earth.
//!
//! The impedance is built bottom-up. The basement half-space has the
//! intrinsic impedance `Z = j*omega*mu / k`; every layer above folds in the
//! impedance of the layer beneath it through a reflection coefficient at the
//! interface and the attenuation across its own thickness:
//!
//! ```text
//! k_i = sqrt(j*omega*mu / rho_i)
//! r_i = (1 - k_i Z_{i+1} / (j*omega*mu)) / (1 + k_i Z_{i+1} / (j*omega*mu))
//! Z_i = j*omega*mu (1 - r_i e^{-2 k_i h_i}) / (k_i (1 + r_i e^{-2 k_i h_i}))
//! ```
//!
//! References: NERC GIC Application Guide (2013); Boteler & Pirjola,
//! "Electric field calculations for real-time space weather alerting
//! systems" (2022).

use crate::error::{DspError, DspResult};
use lib_types::earth::{validate_profile, EarthModel};
use lib_types::impedance::{SurfaceImpedance, NT_TO_MV_PER_KM};
use lib_types::units::{Hertz, MU_0};
use num_complex::Complex64;

/// Surface impedance tensor of a layered model at the given frequencies.
///
/// `resistivities` holds `n` layer resistivities (Ohm-m) from the surface
/// down, `thicknesses` the `n - 1` finite layer thicknesses (m). The result
/// is in nT -> mV/km units. Entries at exactly 0 Hz are zero.
pub fn compute_impedance(
    resistivities: &[f64],
    thicknesses: &[f64],
    frequencies: &[f64],
) -> DspResult<SurfaceImpedance> {
    validate_profile(resistivities, thicknesses)?;
    validate_frequencies(frequencies)?;

    let zxy = frequencies
        .iter()
        .map(|&f| {
            let z = layered_impedance(resistivities, thicknesses, Hertz(f)) * NT_TO_MV_PER_KM;
            if z.is_finite() {
                Ok(z)
            } else {
                Err(DspError::NumericalInstability(format!(
                    "surface impedance at {:e} Hz is not finite",
                    f
                )))
            }
        })
        .collect::<DspResult<Vec<Complex64>>>()?;

    let freqs = frequencies.iter().copied().map(Hertz).collect();
    Ok(SurfaceImpedance::isotropic(freqs, &zxy))
}

/// [`compute_impedance`] for an already validated model.
pub fn impedance_for_model(model: &EarthModel, frequencies: &[f64]) -> DspResult<SurfaceImpedance> {
    compute_impedance(model.resistivities(), model.thicknesses(), frequencies)
}

/// Closed-form impedance of a uniform half-space, `sqrt(j*omega*mu*rho)`,
/// in nT -> mV/km units.
pub fn half_space_impedance(resistivity: f64, frequency: Hertz) -> Complex64 {
    if frequency.is_dc() {
        return Complex64::new(0.0, 0.0);
    }
    let jwm = Complex64::new(0.0, frequency.angular() * MU_0);
    (jwm * resistivity).sqrt() * NT_TO_MV_PER_KM
}

/// E/H impedance (Ohm) at the top of the stack.
///
/// At DC there is no induction; the impedance is defined to be zero and the
/// singular propagation constant is never evaluated.
fn layered_impedance(resistivities: &[f64], thicknesses: &[f64], frequency: Hertz) -> Complex64 {
    if frequency.is_dc() {
        return Complex64::new(0.0, 0.0);
    }

    let jwm = Complex64::new(0.0, frequency.angular() * MU_0);
    let k = |rho: f64| (jwm / rho).sqrt();

    let n = resistivities.len();
    let mut z = jwm / k(resistivities[n - 1]);

    for i in (0..n - 1).rev() {
        let k_i = k(resistivities[i]);
        let ratio = k_i * z / jwm;
        let r = (1.0 - ratio) / (1.0 + ratio);
        let attenuation = (-2.0 * k_i * thicknesses[i]).exp();
        z = jwm * (1.0 - r * attenuation) / (k_i * (1.0 + r * attenuation));
    }

    z
}

fn validate_frequencies(frequencies: &[f64]) -> DspResult<()> {
    if let Some(&bad) = frequencies.iter().find(|f| !(f.is_finite() && **f >= 0.0)) {
        return Err(DspError::InvalidInput(format!(
            "frequencies must be finite and non-negative, got {}",
            bad
        )));
    }
    Ok(())
}
