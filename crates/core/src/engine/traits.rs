//! Trait definitions for the engine module.

use async_trait::async_trait;

use super::error::EngineError;
use super::types::{EngineRequest, ExtractedInfo, ProgressEvent};

/// An extract-and-download engine.
///
/// Any engine that resolves a URL with a format selector, writes the result
/// into `request.output_dir` and reports progress through a callback can be
/// plugged in.
#[async_trait]
pub trait Engine: Send + Sync {
    /// Returns the name of this engine implementation.
    fn name(&self) -> &str;

    /// Extracts and downloads `request.url`.
    ///
    /// `on_progress` is invoked inline, in the order the engine produces
    /// events, and must return quickly. The call completes only once the
    /// engine is done.
    async fn extract(
        &self,
        request: &EngineRequest,
        on_progress: &(dyn Fn(ProgressEvent) + Send + Sync),
    ) -> Result<ExtractedInfo, EngineError>;

    /// Checks that the engine is installed and runnable.
    async fn validate(&self) -> Result<(), EngineError>;
}
