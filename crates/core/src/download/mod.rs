//! Download pipeline: submission, the background worker, progress
//! reporting and status polling.

mod error;
mod headers;
mod poller;
mod progress;
mod quality;
mod service;
mod worker;

pub use error::{DownloadError, MISSING_OUTPUT_MESSAGE};
pub use headers::{
    default_header_rules, HeaderPolicy, HeaderRule, HeaderSet, InvalidHeaderRule,
    DESKTOP_USER_AGENT,
};
pub use poller::{StatusPoller, DEFAULT_POLL_INTERVAL};
pub use progress::{compute_progress, downloading_info, ProgressReporter, PROCESSING_INFO};
pub use quality::{Quality, UnknownQuality};
pub use service::DownloadService;
pub use worker::{DownloadTask, DownloadWorker, OUTPUT_TEMPLATE};
