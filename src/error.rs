//! Error types for annostore.

use thiserror::Error;

/// Result type for annostore operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for annostore operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Error raised by the dataset model.
    #[error(transparent)]
    Core(#[from] annostore_core::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Well-formed JSON that does not describe a valid dataset.
    #[error("Parse error: {0}")]
    Parse(String),
}

impl Error {
    /// Create a parse error.
    #[must_use]
    pub fn parse(msg: impl Into<String>) -> Self {
        Error::Parse(msg.into())
    }

    /// The dataset-model error behind this one, if any.
    #[must_use]
    pub fn as_core(&self) -> Option<&annostore_core::Error> {
        match self {
            Error::Core(e) => Some(e),
            _ => None,
        }
    }
}
