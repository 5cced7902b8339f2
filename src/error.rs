//! Error types for wig-ensemble
//!
//! Every fallible operation in the crate returns [`Result`]. Variants carry
//! enough context (paths, names, shapes) to act on without a debugger.

use thiserror::Error;

/// Result type alias for crate operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced while configuring, loading data, training or checkpointing.
#[derive(Debug, Error)]
pub enum Error {
    /// Filesystem error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Encoding or decoding of a file format failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A configuration file could not be read or parsed.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A configuration value is out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Dataset files are missing or malformed.
    #[error("Dataset error: {0}")]
    Dataset(String),

    /// A checkpoint does not match the model it is loaded into.
    #[error("Checkpoint error: {0}")]
    Checkpoint(String),

    /// Tensor shapes disagree.
    #[error("Shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },
}

impl From<csv::Error> for Error {
    fn from(e: csv::Error) -> Self {
        Error::Serialization(format!("CSV error: {e}"))
    }
}
