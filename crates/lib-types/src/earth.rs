//! One-dimensional layered earth resistivity models.
//!
//! A model is an ordered stack of homogeneous layers, surface first. Every
//! layer but the last has a finite thickness; the last layer is the
//! semi-infinite basement.

use crate::units::{Meters, OhmMeters};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reasons a resistivity/thickness profile is rejected.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ModelError {
    /// No layers at all.
    #[error("earth model must contain at least one layer")]
    Empty,

    /// `resistivities.len() != thicknesses.len() + 1`.
    #[error(
        "{resistivities} resistivities need {} thicknesses, got {thicknesses}",
        .resistivities.saturating_sub(1)
    )]
    LengthMismatch {
        resistivities: usize,
        thicknesses: usize,
    },

    /// Resistivity that is zero, negative or not finite.
    #[error("layer {layer}: resistivity must be positive and finite, got {value}")]
    InvalidResistivity { layer: usize, value: f64 },

    /// Thickness that is zero, negative or not finite.
    #[error("layer {layer}: thickness must be positive and finite, got {value}")]
    InvalidThickness { layer: usize, value: f64 },
}

/// A single layer of the model.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Layer {
    pub resistivity: OhmMeters,

    /// `None` for the basement half-space.
    pub thickness: Option<Meters>,
}

impl Layer {
    #[inline]
    pub fn is_basement(&self) -> bool {
        self.thickness.is_none()
    }
}

/// Validated layered earth model.
///
/// Stored as parallel arrays since that is how the impedance recursion
/// walks it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawEarthModel", into = "RawEarthModel")]
pub struct EarthModel {
    resistivities: Vec<f64>,
    thicknesses: Vec<f64>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct RawEarthModel {
    resistivities: Vec<f64>,
    #[serde(default)]
    thicknesses: Vec<f64>,
}

impl TryFrom<RawEarthModel> for EarthModel {
    type Error = ModelError;

    fn try_from(raw: RawEarthModel) -> Result<Self, Self::Error> {
        Self::new(raw.resistivities, raw.thicknesses)
    }
}

impl From<EarthModel> for RawEarthModel {
    fn from(model: EarthModel) -> Self {
        Self {
            resistivities: model.resistivities,
            thicknesses: model.thicknesses,
        }
    }
}

impl EarthModel {
    /// Build a model from resistivities (Ohm-m) and thicknesses (m).
    pub fn new(resistivities: Vec<f64>, thicknesses: Vec<f64>) -> Result<Self, ModelError> {
        validate_profile(&resistivities, &thicknesses)?;
        Ok(Self {
            resistivities,
            thicknesses,
        })
    }

    /// Uniform half-space of a single resistivity.
    pub fn uniform(resistivity: f64) -> Result<Self, ModelError> {
        Self::new(vec![resistivity], Vec::new())
    }

    /// Number of layers including the basement.
    #[inline]
    pub fn num_layers(&self) -> usize {
        self.resistivities.len()
    }

    /// Layer resistivities, surface first.
    #[inline]
    pub fn resistivities(&self) -> &[f64] {
        &self.resistivities
    }

    /// Finite layer thicknesses, surface first.
    #[inline]
    pub fn thicknesses(&self) -> &[f64] {
        &self.thicknesses
    }

    /// Iterate layers from the surface down.
    pub fn layers(&self) -> impl Iterator<Item = Layer> + '_ {
        self.resistivities.iter().enumerate().map(|(i, &rho)| Layer {
            resistivity: OhmMeters(rho),
            thickness: self.thicknesses.get(i).copied().map(Meters),
        })
    }

    /// Depth of the top of the basement.
    pub fn depth_to_basement(&self) -> Meters {
        Meters(self.thicknesses.iter().sum())
    }

    /// Resistivity of the basement half-space.
    pub fn basement(&self) -> OhmMeters {
        // num_layers() >= 1 is enforced by construction
        OhmMeters(self.resistivities[self.resistivities.len() - 1])
    }
}

/// Check the layered-model invariants on raw arrays.
pub fn validate_profile(resistivities: &[f64], thicknesses: &[f64]) -> Result<(), ModelError> {
    if resistivities.is_empty() {
        return Err(ModelError::Empty);
    }
    if resistivities.len() != thicknesses.len() + 1 {
        return Err(ModelError::LengthMismatch {
            resistivities: resistivities.len(),
            thicknesses: thicknesses.len(),
        });
    }
    if let Some((layer, &value)) = resistivities
        .iter()
        .enumerate()
        .find(|(_, &v)| !(v.is_finite() && v > 0.0))
    {
        return Err(ModelError::InvalidResistivity { layer, value });
    }
    if let Some((layer, &value)) = thicknesses
        .iter()
        .enumerate()
        .find(|(_, &v)| !(v.is_finite() && v > 0.0))
    {
        return Err(ModelError::InvalidThickness { layer, value });
    }
    Ok(())
}
