use std::path::Path;
use std::sync::Arc;
use linxgo_core::{Config, DownloadService, JobStore, SanitizedConfig, StatusPoller};

/// Shared application state
pub struct AppState {
    config: Config,
    service: DownloadService,
    poller: StatusPoller,
}

impl AppState {
    pub fn new(config: Config, service: DownloadService, poller: StatusPoller) -> Self {
        Self {
            config,
            service,
            poller,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn service(&self) -> &DownloadService {
        &self.service
    }

    pub fn poller(&self) -> &StatusPoller {
        &self.poller
    }

    pub fn job_store(&self) -> &Arc<dyn JobStore> {
        self.service.store()
    }

    /// Directory the workers write into.
    pub fn download_dir(&self) -> &Path {
        self.service.download_dir()
    }

    pub fn ui_dir(&self) -> &Path {
        &self.config.server.ui_dir
    }
}
