// src/error.rs

//! Error types for packsmith

use std::path::PathBuf;
use thiserror::Error;

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the descriptor model, the packager and the processors
#[derive(Error, Debug)]
pub enum Error {
    /// Required metadata or input variables are missing
    #[error("validation error: {0}")]
    Validation(String),

    /// An input variable has the wrong shape
    #[error("invalid input variable '{name}': expected {expected}")]
    InvalidInput { name: String, expected: String },

    /// External executable could not be located or started
    #[error("failed to launch {tool}: {reason}")]
    Launch { tool: String, reason: String },

    /// Packaging tool ran but returned a non-zero exit status
    #[error("{tool} pack failed with exit code {}: {stderr}", format_code(.code))]
    Packaging {
        tool: String,
        code: Option<i32>,
        stderr: String,
    },

    /// A wrapped tool other than the packager returned a non-zero exit status
    #[error("{tool} failed with exit code {}: {stderr}", format_code(.code))]
    ToolFailed {
        tool: String,
        code: Option<i32>,
        stderr: String,
    },

    /// signtool rejected the file
    #[error("signature verification failed for {}: {detail}", .path.display())]
    SignatureInvalid { path: PathBuf, detail: String },

    /// Tool reported success but the package file is not there
    #[error("package not found after packing: {}", .0.display())]
    MissingArtifact(PathBuf),

    /// Configuration file could not be parsed
    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a validation error with a message
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create an invalid-input error for a named variable
    pub fn invalid_input(name: &str, expected: &str) -> Self {
        Self::InvalidInput {
            name: name.to_string(),
            expected: expected.to_string(),
        }
    }
}

fn format_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "none (terminated by signal)".to_string(),
    }
}
