//! Real FFT operations using realfft.
//!
//! This module provides a high-level wrapper around realfft with:
//! - Planner caching for repeated transforms
//! - Real-to-complex and complex-to-real transforms of any length
//! - The matching one-sided frequency grid

use crate::error::{DspError, DspResult};
use lib_types::units::{Hertz, Seconds};
use num_complex::Complex64;
use realfft::RealFftPlanner;

/// FFT engine with a cached real-FFT planner.
pub struct FftEngine {
    /// Real FFT planner.
    real_planner: RealFftPlanner<f64>,
}

impl FftEngine {
    /// Create a new FFT engine.
    pub fn new() -> Self {
        Self {
            real_planner: RealFftPlanner::new(),
        }
    }

    /// Perform forward real-to-complex FFT.
    ///
    /// Input: N real samples
    /// Output: N/2 + 1 complex samples (Hermitian symmetry exploited)
    pub fn rfft(&mut self, data: &[f64]) -> DspResult<Vec<Complex64>> {
        let len = data.len();
        if len == 0 {
            return Err(DspError::InsufficientData { needed: 1, got: 0 });
        }
        if len == 1 {
            return Ok(vec![Complex64::new(data[0], 0.0)]);
        }

        let r2c = self.real_planner.plan_fft_forward(len);
        let mut input = data.to_vec();
        let mut output = r2c.make_output_vec();

        r2c.process(&mut input, &mut output)
            .map_err(|e| DspError::NumericalInstability(e.to_string()))?;

        Ok(output)
    }

    /// Perform inverse complex-to-real FFT.
    ///
    /// Input: N/2 + 1 complex samples
    /// Output: N real samples, normalized by 1/N
    ///
    /// The imaginary parts of the DC bin and (for even N) the Nyquist bin
    /// carry no information for a real signal and are discarded.
    pub fn irfft(&mut self, data: &[Complex64], output_len: usize) -> DspResult<Vec<f64>> {
        if output_len == 0 {
            return Err(DspError::InsufficientData { needed: 1, got: 0 });
        }

        let expected_input_len = output_len / 2 + 1;
        if data.len() != expected_input_len {
            return Err(DspError::LengthMismatch {
                expected: expected_input_len,
                actual: data.len(),
            });
        }
        if output_len == 1 {
            return Ok(vec![data[0].re]);
        }

        let mut input = data.to_vec();
        input[0].im = 0.0;
        if output_len % 2 == 0 {
            input[expected_input_len - 1].im = 0.0;
        }

        let c2r = self.real_planner.plan_fft_inverse(output_len);
        let mut output = c2r.make_output_vec();

        c2r.process(&mut input, &mut output)
            .map_err(|e| DspError::NumericalInstability(e.to_string()))?;

        // Normalize
        let scale = 1.0 / output_len as f64;
        for x in output.iter_mut() {
            *x *= scale;
        }

        Ok(output)
    }
}

impl Default for FftEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// One-sided frequency grid of a real FFT of length `n` at spacing `dt`.
///
/// Returns `n/2 + 1` frequencies `k / (n * dt)`, starting at DC.
pub fn rfft_frequencies(n: usize, dt: Seconds) -> Vec<Hertz> {
    let df = 1.0 / (n as f64 * dt.0);
    (0..n / 2 + 1).map(|k| Hertz(k as f64 * df)).collect()
}

/// Compute the magnitude spectrum of a signal.
pub fn magnitude_spectrum(signal: &[f64]) -> DspResult<Vec<f64>> {
    let mut engine = FftEngine::new();
    let spectrum = engine.rfft(signal)?;
    Ok(spectrum.iter().map(|c| c.norm()).collect())
}

/// Frequency of the strongest non-DC bin of a signal.
///
/// Returns `None` when the signal is too short to have a non-DC bin.
pub fn dominant_frequency(signal: &[f64], dt: Seconds) -> DspResult<Option<Hertz>> {
    let magnitudes = magnitude_spectrum(signal)?;
    let freqs = rfft_frequencies(signal.len(), dt);

    let peak = magnitudes
        .iter()
        .enumerate()
        .skip(1)
        .max_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(i, _)| freqs[i]);

    Ok(peak)
}

/// Zero-pad a signal to a specific length.
pub fn zero_pad(signal: &[f64], new_len: usize) -> Vec<f64> {
    let mut result = signal.to_vec();
    if new_len > signal.len() {
        result.resize(new_len, 0.0);
    }
    result
}

/// Padded length `2^(floor(log2 n) + 2)`, at least twice `n`.
///
/// Long enough that the circular wrap-around of the FFT product lands in
/// the zero padding instead of the series.
pub fn padded_len_pow2(n: usize) -> usize {
    if n == 0 {
        return 0;
    }
    let log2 = usize::BITS - 1 - n.leading_zeros();
    1usize << (log2 + 2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_rfft_irfft_roundtrip() {
        let mut engine = FftEngine::new();

        // Non power-of-two length, as for a day of minute data
        for n in [1usize, 2, 7, 64, 1440] {
            let signal: Vec<f64> = (0..n)
                .map(|i| {
                    let t = i as f64 / n as f64;
                    (2.0 * PI * 4.0 * t).sin() + 0.25 * (2.0 * PI * 9.0 * t).cos() + 1.5
                })
                .collect();

            let spectrum = engine.rfft(&signal).unwrap();
            assert_eq!(spectrum.len(), n / 2 + 1);

            let recovered = engine.irfft(&spectrum, n).unwrap();
            for (orig, rec) in signal.iter().zip(recovered.iter()) {
                assert!((orig - rec).abs() < 1e-10, "n={}: {} vs {}", n, orig, rec);
            }
        }
    }

    #[test]
    fn test_irfft_ignores_nyquist_imaginary() {
        let mut engine = FftEngine::new();
        let spectrum = vec![
            Complex64::new(4.0, 0.0),
            Complex64::new(0.0, 0.0),
            Complex64::new(0.0, 3.0),
        ];

        let out = engine.irfft(&spectrum, 4).unwrap();
        for v in out {
            assert!((v - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_irfft_length_mismatch() {
        let mut engine = FftEngine::new();
        let spectrum = vec![Complex64::new(1.0, 0.0); 3];

        let result = engine.irfft(&spectrum, 8);
        assert!(matches!(
            result,
            Err(DspError::LengthMismatch { expected: 5, actual: 3 })
        ));
    }

    #[test]
    fn test_rfft_frequencies() {
        let freqs = rfft_frequencies(1440, Seconds(60.0));
        assert_eq!(freqs.len(), 721);
        assert_eq!(freqs[0], Hertz::ZERO);
        assert!((freqs[1].0 - 1.0 / 86_400.0).abs() < 1e-18);
        // Nyquist for one-minute data
        assert!((freqs[720].0 - 1.0 / 120.0).abs() < 1e-15);

        let odd = rfft_frequencies(5, Seconds(1.0));
        assert_eq!(odd.len(), 3);
        assert!((odd[2].0 - 0.4).abs() < 1e-15);
    }

    #[test]
    fn test_dominant_frequency() {
        let dt = Seconds(60.0);
        let n = 1440;
        let signal: Vec<f64> = (0..n)
            .map(|i| (2.0 * PI * 24.0 * i as f64 / n as f64).sin())
            .collect();

        let peak = dominant_frequency(&signal, dt).unwrap().unwrap();
        assert!((peak.to_period().0 - 3600.0).abs() < 1e-6);

        assert!(dominant_frequency(&[1.0], dt).unwrap().is_none());
    }

    #[test]
    fn test_padded_len_pow2() {
        assert_eq!(padded_len_pow2(1), 4);
        assert_eq!(padded_len_pow2(1440), 4096);
        assert_eq!(padded_len_pow2(1024), 4096);
        assert_eq!(padded_len_pow2(0), 0);
        assert_eq!(zero_pad(&[1.0, 2.0], 4), vec![1.0, 2.0, 0.0, 0.0]);
    }
}
