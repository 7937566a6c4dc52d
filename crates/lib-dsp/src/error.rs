//! Error types for DSP operations.

use lib_types::earth::ModelError;
use thiserror::Error;

/// Errors that can occur during impedance and field computation.
#[derive(Debug, Error)]
pub enum DspError {
    /// Malformed layered earth model.
    #[error("Invalid earth model: {0}")]
    InvalidModel(#[from] ModelError),

    /// Input length mismatch.
    #[error("Input length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    /// Insufficient data for operation.
    #[error("Insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Bad sample interval, frequency or sample value.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Transform size that cannot hold the series.
    #[error("Invalid FFT size {size}: {reason}")]
    InvalidFftSize { size: usize, reason: String },

    /// Non-finite value outside the DC term.
    #[error("Numerical instability: {0}")]
    NumericalInstability(String),
}

/// Result type for DSP operations.
pub type DspResult<T> = Result<T, DspError>;

impl DspError {
    /// Malformed resistivity/thickness profile.
    pub fn is_invalid_model(&self) -> bool {
        matches!(self, DspError::InvalidModel(_))
    }

    /// Rejected time series, cadence or frequency grid.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            DspError::InvalidInput(_)
                | DspError::LengthMismatch { .. }
                | DspError::InsufficientData { .. }
        )
    }
}
