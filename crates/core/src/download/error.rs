//! Errors raised inside a download worker.
//!
//! None of these leave the worker: they are written into the job record and
//! their `Display` text becomes the job's `info`.

use std::path::PathBuf;
use thiserror::Error;

use crate::engine::EngineError;
use crate::job::JobError;

/// Message recorded when the engine succeeded but no output file was found.
pub const MISSING_OUTPUT_MESSAGE: &str = "Downloaded but couldn't find output files.";

#[derive(Debug, Error)]
pub enum DownloadError {
    /// Engine failure, shown verbatim.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// The job record rejected an update.
    #[error(transparent)]
    Job(#[from] JobError),

    #[error("Failed to create download directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to list download directory {path}: {source}")]
    ListOutput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Downloaded but couldn't find output files.")]
    MissingOutput,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_message_passes_through() {
        let err = DownloadError::from(EngineError::failed("network timeout"));
        assert_eq!(err.to_string(), "network timeout");
    }

    #[test]
    fn test_missing_output_message() {
        assert_eq!(DownloadError::MissingOutput.to_string(), MISSING_OUTPUT_MESSAGE);
    }
}
