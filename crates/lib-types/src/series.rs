//! Uniformly sampled field time series.
//!
//! Samples are point measurements: for a series of `N` samples the sample
//! times are
//!
//! ```text
//! t[i] = t_start + i * dt,  for i = 0, 1, ..., N-1
//! ```
//!
//! Magnetic series are in nT and electric series in mV/km; the type does not
//! track which, only the cadence.

use crate::units::Seconds;
use serde::{Deserialize, Serialize};

/// A uniformly-sampled horizontal field component.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldSeries {
    /// Sample values.
    pub samples: Vec<f64>,

    /// Time step between consecutive samples.
    pub dt: Seconds,

    /// Time of the first sample, seconds from an arbitrary epoch.
    #[serde(default)]
    pub t_start: Seconds,
}

impl FieldSeries {
    /// Create a new series from samples.
    pub fn new(samples: Vec<f64>, dt: Seconds, t_start: Seconds) -> Self {
        Self { samples, dt, t_start }
    }

    /// Create a zero-valued series of specified length.
    pub fn zeros(len: usize, dt: Seconds) -> Self {
        Self {
            samples: vec![0.0; len],
            dt,
            t_start: Seconds::ZERO,
        }
    }

    /// Sinusoid `amplitude * sin(2 pi t / period + phase)` sampled `len` times.
    pub fn sinusoid(amplitude: f64, period: Seconds, phase: f64, len: usize, dt: Seconds) -> Self {
        let omega = 2.0 * std::f64::consts::PI / period.0;
        let samples = (0..len)
            .map(|i| amplitude * (omega * i as f64 * dt.0 + phase).sin())
            .collect();
        Self {
            samples,
            dt,
            t_start: Seconds::ZERO,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Total span covered, `N * dt`.
    #[inline]
    pub fn duration(&self) -> Seconds {
        Seconds(self.samples.len() as f64 * self.dt.0)
    }

    /// Time of the sample at `index`.
    #[inline]
    pub fn time_at(&self, index: usize) -> Seconds {
        Seconds(self.t_start.0 + index as f64 * self.dt.0)
    }

    /// Peak-to-peak amplitude.
    pub fn peak_to_peak(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let (min, max) = self.samples.iter().fold((f64::MAX, f64::MIN), |(min, max), &v| {
            (min.min(v), max.max(v))
        });
        max - min
    }

    /// Maximum absolute value.
    pub fn max_abs(&self) -> f64 {
        self.samples.iter().map(|v| v.abs()).fold(0.0, f64::max)
    }

    /// Root mean square value.
    pub fn rms(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let sum_sq: f64 = self.samples.iter().map(|v| v * v).sum();
        (sum_sq / self.samples.len() as f64).sqrt()
    }
}
