//! Error types for the engine module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while running the extraction engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Engine binary not found.
    #[error("yt-dlp not found at path: {path}")]
    BinaryNotFound { path: PathBuf },

    /// The engine ran and reported a failure. The message is passed through
    /// untouched so it can be shown to the user.
    #[error("{message}")]
    Failed { message: String },

    /// The engine succeeded but its output could not be understood.
    #[error("Failed to parse engine output: {reason}")]
    InvalidOutput { reason: String },

    /// I/O error while talking to the engine.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Creates a failure with the engine's own message.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }

    /// Creates an invalid output error.
    pub fn invalid_output(reason: impl Into<String>) -> Self {
        Self::InvalidOutput {
            reason: reason.into(),
        }
    }
}
