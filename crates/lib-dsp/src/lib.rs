//! # lib-dsp
//!
//! Numerical core for deriving geoelectric fields from geomagnetic data.
//!
//! This crate provides:
//!
//! - **FFT/IFFT**: Real-input transforms of arbitrary length with cached plans
//! - **Impedance**: Surface impedance of a 1-D layered earth
//! - **E-field**: Frequency-domain convolution of magnetic with electric fields

pub mod efield;
pub mod error;
pub mod fft;
pub mod impedance;

pub use efield::{derive_e_field, FieldConvolver, ZeroPadding, DEFAULT_DT};
pub use error::{DspError, DspResult};
pub use fft::FftEngine;
pub use impedance::{compute_impedance, half_space_impedance, impedance_for_model};
