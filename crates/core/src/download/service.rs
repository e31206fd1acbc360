//! Submission entry point: turns a URL and quality into a running job.

use std::path::Path;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::info;
use uuid::Uuid;

use super::headers::HeaderPolicy;
use super::quality::Quality;
use super::worker::{DownloadTask, DownloadWorker};
use crate::job::{Job, JobError, JobStore};
use crate::metrics::JOBS_SUBMITTED;

/// Accepts download requests and starts one background worker per job.
pub struct DownloadService {
    store: Arc<dyn JobStore>,
    worker: Arc<DownloadWorker>,
    header_policy: HeaderPolicy,
    limiter: Option<Arc<Semaphore>>,
}

impl DownloadService {
    pub fn new(
        store: Arc<dyn JobStore>,
        worker: DownloadWorker,
        header_policy: HeaderPolicy,
    ) -> Self {
        Self {
            store,
            worker: Arc::new(worker),
            header_policy,
            limiter: None,
        }
    }

    /// Caps the number of workers running at once. Jobs over the cap stay
    /// `queued` until a slot frees up.
    pub fn with_max_concurrent(mut self, max: usize) -> Self {
        self.limiter = Some(Arc::new(Semaphore::new(max)));
        self
    }

    pub fn store(&self) -> &Arc<dyn JobStore> {
        &self.store
    }

    pub fn download_dir(&self) -> &Path {
        self.worker.download_dir()
    }

    /// Creates a queued job and starts its worker without waiting for it.
    ///
    /// A blank URL is not an error: nothing happens and `Ok(None)` is
    /// returned. Must be called from within a tokio runtime.
    pub fn submit(&self, url: &str, quality: Quality) -> Result<Option<Job>, JobError> {
        let url = url.trim();
        if url.is_empty() {
            return Ok(None);
        }

        let job_id = Uuid::new_v4().to_string();
        let job = self.store.create(&job_id, url, quality)?;
        JOBS_SUBMITTED.with_label_values(&[quality.as_str()]).inc();

        let task = DownloadTask {
            job_id: job_id.clone(),
            url: url.to_string(),
            format: quality.format_selector().to_string(),
            headers: self.header_policy.resolve(url),
        };
        info!(
            job_id = %job_id,
            url,
            quality = %quality,
            custom_headers = !task.headers.is_empty(),
            "Download submitted"
        );

        let worker = Arc::clone(&self.worker);
        let limiter = self.limiter.clone();
        tokio::spawn(async move {
            let _permit = match limiter {
                Some(semaphore) => semaphore.acquire_owned().await.ok(),
                None => None,
            };
            worker.run(task).await;
        });

        Ok(Some(job))
    }
}
