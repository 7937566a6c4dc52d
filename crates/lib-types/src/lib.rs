//! # lib-types
//!
//! Core type definitions for geoelectric field derivation.
//!
//! This crate provides the foundational types shared by the workspace:
//! - Physical units with compile-time safety
//! - Layered earth resistivity models
//! - Surface impedance tensors
//! - Uniformly sampled field time series

pub mod earth;
pub mod impedance;
pub mod series;
pub mod units;

pub use earth::*;
pub use impedance::*;
pub use series::*;
pub use units::*;

/// Re-export num_complex for convenience
pub use num_complex::Complex64;
