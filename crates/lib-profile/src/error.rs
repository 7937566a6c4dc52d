//! Error types for resistivity profile loading.

use lib_types::earth::ModelError;
use thiserror::Error;

/// Errors that can occur while reading a resistivity profile.
#[derive(Debug, Error)]
pub enum ProfileError {
    /// I/O error reading the file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed line in the table.
    #[error("Syntax error at line {line}: {message}")]
    Syntax { line: usize, message: String },

    /// Header present but a required column is absent.
    #[error("Missing required column: {0}")]
    MissingColumn(&'static str),

    /// Table parsed but does not describe a valid layered model.
    #[error("Invalid earth model: {0}")]
    InvalidModel(#[from] ModelError),
}

impl ProfileError {
    /// Create a syntax error at a specific line (1-based).
    pub fn syntax(line: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            line,
            message: message.into(),
        }
    }
}

/// Render a nom error with a short preview of where it stopped.
pub(crate) fn describe_nom_error(err: nom::Err<nom::error::Error<&str>>) -> String {
    match err {
        nom::Err::Incomplete(_) => "incomplete input".to_string(),
        nom::Err::Error(e) | nom::Err::Failure(e) => {
            let preview: String = e.input.chars().take(20).collect();
            format!("{:?} at '{}'", e.code, preview)
        }
    }
}
