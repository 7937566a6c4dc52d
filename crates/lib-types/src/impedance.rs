//! Surface impedance tensors.
//!
//! The tensor relates the horizontal magnetic field (nT) to the horizontal
//! electric field (mV/km) at each frequency:
//!
//! ```text
//! | Ex |   | Zxx  Zxy | | Bx |
//! |    | = |          | |    |
//! | Ey |   | Zyx  Zyy | | By |
//! ```
//!
//! Storage is a `[4, n_freq]` array with rows ordered Zxx, Zxy, Zyx, Zyy.

use crate::units::{Hertz, MU_0};
use ndarray::{Array2, ArrayView1};
use num_complex::Complex64;

/// Row index of each tensor component.
pub const ZXX: usize = 0;
pub const ZXY: usize = 1;
pub const ZYX: usize = 2;
pub const ZYY: usize = 3;

/// Factor converting an E/H impedance (Ohm) into mV/km per nT.
pub const NT_TO_MV_PER_KM: f64 = 1.0e-3 / MU_0;

/// Per-frequency 2x2 impedance tensor in B-field (nT -> mV/km) units.
#[derive(Clone, Debug, PartialEq)]
pub struct SurfaceImpedance {
    frequencies: Vec<Hertz>,
    tensor: Array2<Complex64>,
}

impl SurfaceImpedance {
    /// Assemble the isotropic 1-D tensor `[0, Z; -Z, 0]`.
    pub fn isotropic(frequencies: Vec<Hertz>, zxy: &[Complex64]) -> Self {
        debug_assert_eq!(frequencies.len(), zxy.len());

        let mut tensor = Array2::zeros((4, frequencies.len()));
        for (j, &z) in zxy.iter().enumerate() {
            tensor[[ZXY, j]] = z;
            tensor[[ZYX, j]] = -z;
        }
        Self { frequencies, tensor }
    }

    /// Number of frequency points.
    #[inline]
    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    pub fn frequencies(&self) -> &[Hertz] {
        &self.frequencies
    }

    /// The raw `[4, n_freq]` tensor.
    pub fn tensor(&self) -> &Array2<Complex64> {
        &self.tensor
    }

    pub fn zxx(&self) -> ArrayView1<'_, Complex64> {
        self.tensor.row(ZXX)
    }

    pub fn zxy(&self) -> ArrayView1<'_, Complex64> {
        self.tensor.row(ZXY)
    }

    pub fn zyx(&self) -> ArrayView1<'_, Complex64> {
        self.tensor.row(ZYX)
    }

    pub fn zyy(&self) -> ArrayView1<'_, Complex64> {
        self.tensor.row(ZYY)
    }

    /// Tensor at one frequency index as `[Zxx, Zxy, Zyx, Zyy]`.
    pub fn at(&self, index: usize) -> [Complex64; 4] {
        [
            self.tensor[[ZXX, index]],
            self.tensor[[ZXY, index]],
            self.tensor[[ZYX, index]],
            self.tensor[[ZYY, index]],
        ]
    }

    /// Apparent resistivity (Ohm-m) of the Zxy component.
    ///
    /// `rho_a = |Z_EH|^2 / (omega * mu0)` where `Z_EH` is the impedance in
    /// E/H units. Zero at DC.
    pub fn apparent_resistivity(&self) -> Vec<f64> {
        self.frequencies
            .iter()
            .zip(self.zxy().iter())
            .map(|(f, z)| {
                if f.is_dc() {
                    return 0.0;
                }
                let z_eh = *z / NT_TO_MV_PER_KM;
                z_eh.norm_sqr() / (f.angular() * MU_0)
            })
            .collect()
    }

    /// Phase of Zxy in degrees.
    pub fn phase_degrees(&self) -> Vec<f64> {
        self.zxy().iter().map(|z| z.arg().to_degrees()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_isotropic_layout() {
        let z = Complex64::new(1.0, 2.0);
        let freqs = vec![Hertz(0.0), Hertz(1e-3)];
        let imp = SurfaceImpedance::isotropic(freqs, &[Complex64::new(0.0, 0.0), z]);

        assert_eq!(imp.len(), 2);
        let [xx, xy, yx, yy] = imp.at(1);
        assert_eq!(xx, Complex64::new(0.0, 0.0));
        assert_eq!(xy, z);
        assert_eq!(yx, -z);
        assert_eq!(yy, Complex64::new(0.0, 0.0));
    }

    #[test]
    fn test_apparent_resistivity_zero_at_dc() {
        let imp = SurfaceImpedance::isotropic(vec![Hertz(0.0)], &[Complex64::new(0.0, 0.0)]);
        assert_eq!(imp.apparent_resistivity(), vec![0.0]);
    }

    #[test]
    fn test_phase_of_half_space_is_45_degrees() {
        // sqrt(j) has argument pi/4
        let z = Complex64::new(0.0, 1.0).sqrt() * 3.0;
        let imp = SurfaceImpedance::isotropic(vec![Hertz(0.01)], &[z]);
        assert!((imp.phase_degrees()[0] - 45.0).abs() < 1e-12);
    }
}
