//! Testing utilities and mock implementations.
//!
//! The mock engine stands in for yt-dlp so that the whole pipeline can run
//! in tests without network access or the binary installed.
//!
//! # Example
//!
//! ```rust,ignore
//! use linxgo_core::testing::{fixtures, MockEngine};
//!
//! let engine = MockEngine::new();
//! engine.set_events(fixtures::transfer_events(1024, 4)).await;
//!
//! // Use in a DownloadWorker...
//! ```

mod mock_engine;

pub use mock_engine::MockEngine;

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::engine::ProgressEvent;

    /// A transfer of `total` bytes reported in `steps` equal chunks, then
    /// a `finished` event.
    pub fn transfer_events(total: u64, steps: u64) -> Vec<ProgressEvent> {
        let steps = steps.max(1);
        let mut events: Vec<_> = (1..=steps)
            .map(|i| {
                ProgressEvent::downloading(total * i / steps, Some(total))
                    .with_eta(steps - i)
                    .with_speed(1024.0)
            })
            .collect();
        events.push(ProgressEvent::finished());
        events
    }
}
