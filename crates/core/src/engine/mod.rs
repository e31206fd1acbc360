//! Engine module: the boundary to the third-party extractor/downloader.
//!
//! This module provides the `Engine` trait and a yt-dlp implementation that
//! runs the binary as a subprocess and turns its output into progress events
//! and result metadata.
//!
//! # Example
//!
//! ```ignore
//! use linxgo_core::engine::{Engine, EngineRequest, YtDlpEngine};
//!
//! let engine = YtDlpEngine::with_defaults();
//! engine.validate().await?;
//!
//! let info = engine
//!     .extract(&request, &|event| println!("{:?}", event.status))
//!     .await?;
//! println!("Wrote {:?}", info.expected_filenames());
//! ```

mod config;
mod error;
mod traits;
mod types;
mod ytdlp;

pub use config::EngineConfig;
pub use error::EngineError;
pub use traits::Engine;
pub use types::{
    EngineRequest, ExtractedInfo, ProgressEvent, ProgressStatus, DEFAULT_EXTENSION,
};
pub use ytdlp::YtDlpEngine;
