pub mod config;
pub mod download;
pub mod engine;
pub mod job;
pub mod metrics;
pub mod testing;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, DownloadsConfig,
    SanitizedConfig, ServerConfig,
};
pub use download::{
    DownloadError, DownloadService, DownloadWorker, HeaderPolicy, HeaderRule, ProgressReporter,
    Quality, StatusPoller,
};
pub use engine::{Engine, EngineConfig, EngineError, YtDlpEngine};
pub use job::{InMemoryJobStore, Job, JobError, JobState, JobStore, JobUpdate};
