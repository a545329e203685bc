//! Error types for the respira library.
//!
//! All failures are represented by the [`RespiraError`] enum, which carries
//! enough context to tell a configuration problem apart from a corrupted
//! artifact or a bad inference request.
//!
//! # Examples
//!
//! ```
//! use respira::error::{RespiraError, Result};
//!
//! fn example_operation() -> Result<()> {
//!     Err(RespiraError::config("feature column is empty"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::io;

use anyhow;
use thiserror::Error;

/// The main error type for respira operations.
///
/// Uses the `thiserror` crate for automatic `Error` trait implementation and
/// provides convenient constructor methods for the common cases.
#[derive(Error, Debug)]
pub enum RespiraError {
    /// I/O errors (corpus files, artifact files)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Invalid training configuration (empty column, empty corpus, bad
    /// hyperparameters)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Survey schema / corpus record errors
    #[error("Survey error: {0}")]
    Survey(String),

    /// Model training or prediction errors
    #[error("Model error: {0}")]
    Model(String),

    /// Persisted artifact errors (missing, corrupt, incompatible)
    #[error("Artifact error: {0}")]
    Artifact(String),

    /// Inference request validation errors
    #[error("Input error: {0}")]
    Input(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error for other cases
    #[error("Error: {0}")]
    Other(String),

    /// Generic anyhow error
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with RespiraError.
pub type Result<T> = std::result::Result<T, RespiraError>;

impl RespiraError {
    /// Create a new configuration error.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        RespiraError::Config(msg.into())
    }

    /// Create a new survey error.
    pub fn survey<S: Into<String>>(msg: S) -> Self {
        RespiraError::Survey(msg.into())
    }

    /// Create a new model error.
    pub fn model<S: Into<String>>(msg: S) -> Self {
        RespiraError::Model(msg.into())
    }

    /// Create a new artifact error.
    pub fn artifact<S: Into<String>>(msg: S) -> Self {
        RespiraError::Artifact(msg.into())
    }

    /// Create a new input validation error.
    pub fn input<S: Into<String>>(msg: S) -> Self {
        RespiraError::Input(msg.into())
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        RespiraError::Other(msg.into())
    }

    /// Create a new not found error.
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        RespiraError::Other(format!("Not found: {}", msg.into()))
    }
}
