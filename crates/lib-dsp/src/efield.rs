//! Geoelectric field from geomagnetic field by frequency-domain convolution.
//!
//! The two horizontal magnetic components are transformed with a real FFT,
//! multiplied by the surface impedance tensor on the matching one-sided
//! frequency grid, and transformed back:
//!
//! ```text
//! Ex(f) = Zxx(f) Bx(f) + Zxy(f) By(f)
//! Ey(f) = Zyx(f) Bx(f) + Zyy(f) By(f)
//! ```
//!
//! # Padding
//!
//! By default the transform length equals the series length, so the product
//! is a circular convolution over the series. [`ZeroPadding::PowerOfTwo`]
//! transforms at `2^(floor(log2 N) + 2)` samples instead, which moves the
//! wrap-around into the padding at the cost of changing the edge behaviour.
//! Either way the output is truncated back to `N` samples.

use crate::error::{DspError, DspResult};
use crate::fft::{padded_len_pow2, rfft_frequencies, zero_pad, FftEngine};
use crate::impedance::impedance_for_model;
use lib_types::earth::EarthModel;
use lib_types::impedance::SurfaceImpedance;
use lib_types::series::FieldSeries;
use lib_types::units::Seconds;
use num_complex::Complex64;

/// Default magnetometer cadence.
pub const DEFAULT_DT: Seconds = Seconds::ONE_MINUTE;

/// Transform length policy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ZeroPadding {
    /// Transform at the series length.
    #[default]
    None,

    /// Zero-pad to `2^(floor(log2 N) + 2)` samples.
    PowerOfTwo,

    /// Zero-pad to a fixed size, which must be at least the series length.
    Fixed { size: usize },
}

impl ZeroPadding {
    /// Transform length for a series of `n` samples.
    pub fn fft_len(&self, n: usize) -> DspResult<usize> {
        match *self {
            ZeroPadding::None => Ok(n),
            ZeroPadding::PowerOfTwo => Ok(padded_len_pow2(n)),
            ZeroPadding::Fixed { size } => {
                if size < n {
                    return Err(DspError::InvalidFftSize {
                        size,
                        reason: format!("smaller than series length {}", n),
                    });
                }
                Ok(size)
            }
        }
    }
}

/// Impedance computed for one (model, transform length, dt) combination.
struct CachedImpedance {
    model: EarthModel,
    fft_len: usize,
    dt: Seconds,
    impedance: SurfaceImpedance,
}

/// Reusable magnetic-to-electric field convolver.
///
/// Holds the FFT planner and the most recently used impedance so that
/// repeated derivations for one station (same model, length and cadence)
/// skip the impedance recursion. A different model always recomputes.
pub struct FieldConvolver {
    engine: FftEngine,
    padding: ZeroPadding,
    cache: Option<CachedImpedance>,
}

impl FieldConvolver {
    /// Create a convolver with the given padding policy.
    pub fn new(padding: ZeroPadding) -> Self {
        Self {
            engine: FftEngine::new(),
            padding,
            cache: None,
        }
    }

    pub fn padding(&self) -> ZeroPadding {
        self.padding
    }

    /// Model of the impedance currently held for reuse, if any.
    pub fn cached_model(&self) -> Option<&EarthModel> {
        self.cache.as_ref().map(|c| &c.model)
    }

    /// Derive `(e_north, e_east)` in mV/km from `(mag_north, mag_east)` in nT.
    ///
    /// Both outputs have exactly the input length.
    pub fn derive(
        &mut self,
        mag_north: &[f64],
        mag_east: &[f64],
        model: &EarthModel,
        dt: Seconds,
    ) -> DspResult<(Vec<f64>, Vec<f64>)> {
        let n = validate_series(mag_north, mag_east, dt)?;
        let fft_len = self.padding.fft_len(n)?;

        let bx = self.engine.rfft(&zero_pad(mag_north, fft_len))?;
        let by = self.engine.rfft(&zero_pad(mag_east, fft_len))?;

        let impedance = self.impedance(model, fft_len, dt)?;
        let (ex_spectrum, ey_spectrum) = apply_tensor(impedance, &bx, &by);

        let mut e_north = self.engine.irfft(&ex_spectrum, fft_len)?;
        let mut e_east = self.engine.irfft(&ey_spectrum, fft_len)?;
        e_north.truncate(n);
        e_east.truncate(n);

        if !(e_north.iter().all(|v| v.is_finite()) && e_east.iter().all(|v| v.is_finite())) {
            return Err(DspError::NumericalInstability(
                "electric field contains non-finite samples".to_string(),
            ));
        }

        Ok((e_north, e_east))
    }

    /// [`FieldConvolver::derive`] on series that carry their own cadence.
    pub fn derive_series(
        &mut self,
        mag_north: &FieldSeries,
        mag_east: &FieldSeries,
        model: &EarthModel,
    ) -> DspResult<(FieldSeries, FieldSeries)> {
        let dt = mag_north.dt;
        if (mag_east.dt.0 - dt.0).abs() > 1e-9 * dt.0.abs() {
            return Err(DspError::InvalidInput(format!(
                "sample intervals differ: {} s vs {} s",
                dt.0, mag_east.dt.0
            )));
        }

        let (e_north, e_east) = self.derive(&mag_north.samples, &mag_east.samples, model, dt)?;
        Ok((
            FieldSeries::new(e_north, dt, mag_north.t_start),
            FieldSeries::new(e_east, dt, mag_east.t_start),
        ))
    }

    fn impedance(
        &mut self,
        model: &EarthModel,
        fft_len: usize,
        dt: Seconds,
    ) -> DspResult<&SurfaceImpedance> {
        let cached = match self.cache.take() {
            Some(c) if c.fft_len == fft_len && c.dt == dt && c.model == *model => {
                tracing::trace!(
                    "Reusing impedance for {} layers, fft_len={}",
                    model.num_layers(),
                    fft_len
                );
                c
            }
            _ => {
                let freqs: Vec<f64> = rfft_frequencies(fft_len, dt).iter().map(|f| f.0).collect();

                tracing::debug!(
                    "Computing impedance: layers={}, fft_len={}, df={:.3e} Hz",
                    model.num_layers(),
                    fft_len,
                    1.0 / (fft_len as f64 * dt.0)
                );

                CachedImpedance {
                    model: model.clone(),
                    fft_len,
                    dt,
                    impedance: impedance_for_model(model, &freqs)?,
                }
            }
        };

        Ok(&self.cache.insert(cached).impedance)
    }
}

impl Default for FieldConvolver {
    fn default() -> Self {
        Self::new(ZeroPadding::None)
    }
}

/// Derive the electric field from two magnetic series.
///
/// `mag_north`/`mag_east` in nT, `resistivities` (Ohm-m) and `thicknesses`
/// (m) describe the layered earth, `dt` is the sample interval in seconds
/// (conventionally [`DEFAULT_DT`]). Returns `(e_north, e_east)` in mV/km,
/// sample-aligned with the input.
pub fn derive_e_field(
    mag_north: &[f64],
    mag_east: &[f64],
    resistivities: &[f64],
    thicknesses: &[f64],
    dt: f64,
) -> DspResult<(Vec<f64>, Vec<f64>)> {
    validate_series(mag_north, mag_east, Seconds(dt))?;
    let model = EarthModel::new(resistivities.to_vec(), thicknesses.to_vec())?;

    FieldConvolver::default().derive(mag_north, mag_east, &model, Seconds(dt))
}

/// Apply the impedance tensor bin by bin.
fn apply_tensor(
    impedance: &SurfaceImpedance,
    bx: &[Complex64],
    by: &[Complex64],
) -> (Vec<Complex64>, Vec<Complex64>) {
    let zxx = impedance.zxx();
    let zxy = impedance.zxy();
    let zyx = impedance.zyx();
    let zyy = impedance.zyy();

    let mut ex = Vec::with_capacity(bx.len());
    let mut ey = Vec::with_capacity(bx.len());
    for (j, (&hx, &hy)) in bx.iter().zip(by.iter()).enumerate() {
        ex.push(zxx[j] * hx + zxy[j] * hy);
        ey.push(zyx[j] * hx + zyy[j] * hy);
    }
    (ex, ey)
}

/// Returns the common series length.
fn validate_series(mag_north: &[f64], mag_east: &[f64], dt: Seconds) -> DspResult<usize> {
    if mag_north.len() != mag_east.len() {
        return Err(DspError::LengthMismatch {
            expected: mag_north.len(),
            actual: mag_east.len(),
        });
    }
    if mag_north.is_empty() {
        return Err(DspError::InsufficientData { needed: 1, got: 0 });
    }
    if !(dt.0.is_finite() && dt.0 > 0.0) {
        return Err(DspError::InvalidInput(format!(
            "sample interval must be positive, got {} s",
            dt.0
        )));
    }
    if let Some(i) = mag_north
        .iter()
        .zip(mag_east.iter())
        .position(|(x, y)| !(x.is_finite() && y.is_finite()))
    {
        return Err(DspError::InvalidInput(format!(
            "magnetic field sample {} is not finite",
            i
        )));
    }
    Ok(mag_north.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lib_types::earth::ModelError;
    use std::f64::consts::PI;

    fn storm_like(n: usize) -> (Vec<f64>, Vec<f64>) {
        let bx = (0..n)
            .map(|i| {
                let t = i as f64;
                80.0 * (2.0 * PI * t / 137.0).sin() + 25.0 * (2.0 * PI * t / 19.0).cos() + 0.01 * t
            })
            .collect();
        let by = (0..n)
            .map(|i| {
                let t = i as f64;
                -40.0 * (2.0 * PI * t / 61.0).cos() + 10.0 * (2.0 * PI * t / 7.0).sin()
            })
            .collect();
        (bx, by)
    }

    fn two_layer() -> EarthModel {
        EarthModel::new(vec![100.0, 1000.0], vec![10_000.0]).unwrap()
    }

    #[test]
    fn test_zero_input_gives_zero_output() {
        for n in [1usize, 2, 3, 100, 1440] {
            let zeros = vec![0.0; n];
            let (ex, ey) =
                derive_e_field(&zeros, &zeros, &[100.0, 10.0, 1000.0], &[500.0, 20_000.0], 60.0)
                    .unwrap();
            assert!(ex.iter().chain(ey.iter()).all(|&v| v == 0.0));
        }
    }

    #[test]
    fn test_length_preserved() {
        for n in 1..=33 {
            let (bx, by) = storm_like(n);
            let (ex, ey) = derive_e_field(&bx, &by, &[100.0, 1000.0], &[10_000.0], 60.0).unwrap();
            assert_eq!(ex.len(), n);
            assert_eq!(ey.len(), n);
        }
    }

    #[test]
    fn test_single_sample_has_only_dc() {
        let (ex, ey) = derive_e_field(&[42.0], &[-7.0], &[100.0], &[], 60.0).unwrap();
        assert_eq!(ex, vec![0.0]);
        assert_eq!(ey, vec![0.0]);
    }

    #[test]
    fn test_doubling_input_doubles_output() {
        let (bx, by) = storm_like(500);
        let bx2: Vec<f64> = bx.iter().map(|v| 2.0 * v).collect();
        let by2: Vec<f64> = by.iter().map(|v| 2.0 * v).collect();

        let (ex, ey) = derive_e_field(&bx, &by, &[100.0, 1000.0], &[10_000.0], 60.0).unwrap();
        let (ex2, ey2) = derive_e_field(&bx2, &by2, &[100.0, 1000.0], &[10_000.0], 60.0).unwrap();

        let scale = ex.iter().chain(ey.iter()).map(|v| v.abs()).fold(0.0, f64::max);
        for (a, b) in ex.iter().zip(ex2.iter()).chain(ey.iter().zip(ey2.iter())) {
            assert!((2.0 * a - b).abs() <= 1e-12 * scale);
        }
    }

    #[test]
    fn test_constant_field_induces_nothing() {
        // A constant field lives entirely in the DC bin
        let (ex, ey) = derive_e_field(&[50.0; 64], &[-20.0; 64], &[100.0], &[], 60.0).unwrap();
        assert!(ex.iter().chain(ey.iter()).all(|v| v.abs() < 1e-12));
    }

    #[test]
    fn test_components_swap_with_opposite_sign() {
        // Ex depends only on By and Ey only on Bx, with Zyx = -Zxy
        let (b, _) = storm_like(256);
        let zeros = vec![0.0; 256];

        let (ex, ey) = derive_e_field(&zeros, &b, &[300.0], &[], 10.0).unwrap();
        assert!(ey.iter().all(|&v| v == 0.0));

        let (ex2, ey2) = derive_e_field(&b, &zeros, &[300.0], &[], 10.0).unwrap();
        assert!(ex2.iter().all(|&v| v == 0.0));
        for (a, c) in ex.iter().zip(ey2.iter()) {
            assert!((a + c).abs() < 1e-9);
        }
    }

    #[test]
    fn test_mismatched_lengths() {
        let err = derive_e_field(&vec![1.0; 100], &vec![1.0; 99], &[100.0], &[], 60.0).unwrap_err();
        assert!(matches!(
            err,
            DspError::LengthMismatch { expected: 100, actual: 99 }
        ));
        assert!(err.is_invalid_input());
    }

    #[test]
    fn test_mismatch_reported_before_model() {
        // Both inputs and model are bad; the inputs are checked first
        let err = derive_e_field(&[1.0, 2.0], &[1.0], &[100.0, 10.0], &[], 60.0).unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[test]
    fn test_invalid_model_propagates() {
        let (bx, by) = storm_like(10);
        let err = derive_e_field(&bx, &by, &[100.0, 10.0], &[], 60.0).unwrap_err();
        assert!(matches!(
            err,
            DspError::InvalidModel(ModelError::LengthMismatch { .. })
        ));
        assert!(err.is_invalid_model());

        let err = derive_e_field(&bx, &by, &[100.0, 0.0], &[1000.0], 60.0).unwrap_err();
        assert!(err.is_invalid_model());
    }

    #[test]
    fn test_invalid_inputs() {
        let (bx, by) = storm_like(10);
        assert!(derive_e_field(&bx, &by, &[100.0], &[], 0.0).unwrap_err().is_invalid_input());
        assert!(derive_e_field(&bx, &by, &[100.0], &[], -60.0).unwrap_err().is_invalid_input());
        assert!(derive_e_field(&[], &[], &[100.0], &[], 60.0).unwrap_err().is_invalid_input());

        let mut nan = bx.clone();
        nan[3] = f64::NAN;
        assert!(derive_e_field(&nan, &by, &[100.0], &[], 60.0).unwrap_err().is_invalid_input());
    }

    #[test]
    fn test_padding_policies_preserve_length() {
        let (bx, by) = storm_like(1000);
        let model = two_layer();

        for padding in [
            ZeroPadding::None,
            ZeroPadding::PowerOfTwo,
            ZeroPadding::Fixed { size: 1500 },
        ] {
            let mut conv = FieldConvolver::new(padding);
            let (ex, ey) = conv.derive(&bx, &by, &model, DEFAULT_DT).unwrap();
            assert_eq!(ex.len(), 1000);
            assert_eq!(ey.len(), 1000);
            assert!(ex.iter().any(|v| v.abs() > 0.0));
        }
    }

    #[test]
    fn test_fixed_padding_too_small() {
        let (bx, by) = storm_like(100);
        let mut conv = FieldConvolver::new(ZeroPadding::Fixed { size: 64 });
        let err = conv.derive(&bx, &by, &two_layer(), DEFAULT_DT).unwrap_err();
        assert!(matches!(err, DspError::InvalidFftSize { size: 64, .. }));
    }

    #[test]
    fn test_padding_sizes() {
        assert_eq!(ZeroPadding::None.fft_len(1440).unwrap(), 1440);
        assert_eq!(ZeroPadding::PowerOfTwo.fft_len(1440).unwrap(), 4096);
        assert_eq!(ZeroPadding::Fixed { size: 2048 }.fft_len(1440).unwrap(), 2048);
    }

    #[test]
    fn test_convolver_matches_free_function() {
        let (bx, by) = storm_like(300);
        let expected = derive_e_field(&bx, &by, &[100.0, 1000.0], &[10_000.0], 60.0).unwrap();

        let mut conv = FieldConvolver::default();
        let first = conv.derive(&bx, &by, &two_layer(), DEFAULT_DT).unwrap();
        let second = conv.derive(&bx, &by, &two_layer(), DEFAULT_DT).unwrap();

        assert_eq!(first, expected);
        assert_eq!(second, expected);
    }

    #[test]
    fn test_cache_does_not_conflate_models() {
        let (bx, by) = storm_like(300);
        let resistive = EarthModel::uniform(10_000.0).unwrap();
        let conductive = EarthModel::uniform(1.0).unwrap();

        let mut conv = FieldConvolver::default();
        let (ex_r, _) = conv.derive(&bx, &by, &resistive, DEFAULT_DT).unwrap();
        let (ex_c, _) = conv.derive(&bx, &by, &conductive, DEFAULT_DT).unwrap();

        let (fresh, _) = FieldConvolver::default()
            .derive(&bx, &by, &conductive, DEFAULT_DT)
            .unwrap();
        assert_eq!(ex_c, fresh);

        // E scales with sqrt(rho) for a half-space
        let ratio = FieldSeries::new(ex_r, DEFAULT_DT, Seconds::ZERO).rms()
            / FieldSeries::new(ex_c, DEFAULT_DT, Seconds::ZERO).rms();
        assert!((ratio - 100.0).abs() < 1e-6);
    }

    #[test]
    fn test_cache_holds_last_model() {
        let (bx, by) = storm_like(64);
        let mut conv = FieldConvolver::default();
        assert!(conv.cached_model().is_none());

        conv.derive(&bx, &by, &two_layer(), DEFAULT_DT).unwrap();
        assert_eq!(conv.cached_model(), Some(&two_layer()));

        let uniform = EarthModel::uniform(50.0).unwrap();
        conv.derive(&bx, &by, &uniform, DEFAULT_DT).unwrap();
        assert_eq!(conv.cached_model(), Some(&uniform));
    }

    #[test]
    fn test_overflowing_frequency_grid_is_unstable() {
        // 1 / (2 * dt) is finite but its angular frequency is not
        let err = derive_e_field(&[1.0, 2.0], &[1.0, 2.0], &[100.0], &[], 1e-308).unwrap_err();
        assert!(matches!(err, DspError::NumericalInstability(_)));

        let mut conv = FieldConvolver::default();
        let err = conv.derive(&[1.0, 2.0], &[1.0, 2.0], &two_layer(), Seconds(1e-308)).unwrap_err();
        assert!(matches!(err, DspError::NumericalInstability(_)));
        assert!(conv.cached_model().is_none());
    }

    #[test]
    fn test_derive_series() {
        let (bx, by) = storm_like(120);
        let north = FieldSeries::new(bx, Seconds(1.0), Seconds(3600.0));
        let east = FieldSeries::new(by, Seconds(1.0), Seconds(3600.0));

        let mut conv = FieldConvolver::default();
        let (en, ee) = conv.derive_series(&north, &east, &two_layer()).unwrap();
        assert_eq!(en.len(), 120);
        assert_eq!(ee.dt, Seconds(1.0));
        assert_eq!(en.t_start, Seconds(3600.0));

        let slow = FieldSeries::new(east.samples.clone(), Seconds(60.0), Seconds::ZERO);
        assert!(conv.derive_series(&north, &slow, &two_layer()).is_err());
    }
}
