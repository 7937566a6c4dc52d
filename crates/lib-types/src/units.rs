//! Physical units with type safety.
//!
//! These newtypes keep sample intervals, frequencies, resistivities and
//! layer thicknesses from being mixed up at API boundaries.

use serde::{Deserialize, Serialize};

/// Magnetic permeability of free space (H/m).
pub const MU_0: f64 = 4.0 * std::f64::consts::PI * 1e-7;

/// Time duration in seconds.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Seconds(pub f64);

impl Seconds {
    pub const ZERO: Self = Self(0.0);

    /// One-minute cadence, the usual magnetometer sample interval.
    pub const ONE_MINUTE: Self = Self(60.0);

    #[inline]
    pub fn as_hours(&self) -> f64 {
        self.0 / 3600.0
    }

    /// Convert to frequency (reciprocal).
    #[inline]
    pub fn to_frequency(&self) -> Hertz {
        Hertz(1.0 / self.0)
    }
}

/// Frequency in Hertz.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Hertz(pub f64);

impl Hertz {
    pub const ZERO: Self = Self(0.0);

    /// Convert to period (reciprocal).
    #[inline]
    pub fn to_period(&self) -> Seconds {
        Seconds(1.0 / self.0)
    }

    /// Angular frequency (omega = 2 * pi * f).
    #[inline]
    pub fn angular(&self) -> f64 {
        2.0 * std::f64::consts::PI * self.0
    }

    #[inline]
    pub fn is_dc(&self) -> bool {
        self.0 == 0.0
    }
}

/// Bulk resistivity in Ohm-meters.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct OhmMeters(pub f64);

impl OhmMeters {
    /// Electromagnetic skin depth at a given frequency.
    ///
    /// `delta = sqrt(2 * rho / (omega * mu0))`
    #[inline]
    pub fn skin_depth(&self, frequency: Hertz) -> Meters {
        Meters((2.0 * self.0 / (frequency.angular() * MU_0)).sqrt())
    }
}

/// Length in meters.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Meters(pub f64);

impl Meters {
    #[inline]
    pub fn as_km(&self) -> f64 {
        self.0 * 1e-3
    }
}
