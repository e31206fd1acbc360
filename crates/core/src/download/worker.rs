//! Background worker that runs one download from start to terminal state.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::error::DownloadError;
use super::headers::HeaderSet;
use super::progress::{ProgressReporter, PROCESSING_INFO};
use crate::engine::{Engine, EngineRequest, ProgressEvent};
use crate::job::{Job, JobState, JobStore, JobUpdate};
use crate::metrics::{DOWNLOADS_ACTIVE, DOWNLOAD_DURATION, JOBS_FAILED, JOBS_FINISHED};

/// Output template handed to the engine. Must stay in step with
/// `ExtractedInfo::expected_filename`, which is how output is found again.
pub const OUTPUT_TEMPLATE: &str = "%(id)s.%(ext)s";

/// Input for a single worker run.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadTask {
    pub job_id: String,
    pub url: String,
    /// Format selector handed to the engine.
    pub format: String,
    /// Header overrides; empty means none.
    pub headers: HeaderSet,
}

/// Drives the engine for a job and records the outcome in the job store.
pub struct DownloadWorker {
    store: Arc<dyn JobStore>,
    engine: Arc<dyn Engine>,
    reporter: ProgressReporter,
    download_dir: PathBuf,
}

impl DownloadWorker {
    pub fn new(
        store: Arc<dyn JobStore>,
        engine: Arc<dyn Engine>,
        download_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            reporter: ProgressReporter::new(Arc::clone(&store)),
            store,
            engine,
            download_dir: download_dir.into(),
        }
    }

    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    /// Runs the task to completion and returns the final job snapshot.
    ///
    /// Never fails: any error is recorded on the job as `error` with the
    /// error's message.
    pub async fn run(&self, task: DownloadTask) -> Option<Job> {
        if let Err(e) = self.store.get(&task.job_id) {
            warn!(job_id = %task.job_id, error = %e, "Skipping download for unknown job");
            return None;
        }

        let start = Instant::now();
        DOWNLOADS_ACTIVE.inc();

        let (update, result) = match self.execute(&task).await {
            Ok(files) => {
                info!(job_id = %task.job_id, files = files.len(), "Download finished");
                JOBS_FINISHED.inc();
                let update = JobUpdate::new()
                    .state(JobState::Finished)
                    .progress(100.0)
                    .info(format!("{} file(s) ready", files.len()))
                    .files(files);
                (update, "success")
            }
            Err(e) => {
                warn!(job_id = %task.job_id, url = %task.url, error = %e, "Download failed");
                JOBS_FAILED.inc();
                (JobUpdate::error(e.to_string()), "failed")
            }
        };

        DOWNLOADS_ACTIVE.dec();
        DOWNLOAD_DURATION
            .with_label_values(&[result])
            .observe(start.elapsed().as_secs_f64());

        match self.store.update(&task.job_id, update) {
            Ok(job) => Some(job),
            Err(e) => {
                warn!(job_id = %task.job_id, error = %e, "Could not record download outcome");
                self.store.get(&task.job_id).ok()
            }
        }
    }

    /// Steps 1-4: configure, run the engine, verify output.
    async fn execute(&self, task: &DownloadTask) -> Result<Vec<String>, DownloadError> {
        self.store.update(
            &task.job_id,
            JobUpdate::new()
                .state(JobState::Starting)
                .progress(0.0)
                .info("Preparing download..."),
        )?;

        tokio::fs::create_dir_all(&self.download_dir)
            .await
            .map_err(|source| DownloadError::CreateDir {
                path: self.download_dir.clone(),
                source,
            })?;

        let request = EngineRequest {
            url: task.url.clone(),
            format: task.format.clone(),
            output_dir: self.download_dir.clone(),
            output_template: OUTPUT_TEMPLATE.to_string(),
            http_headers: task.headers.clone(),
            quiet: true,
            playlist: true,
            restrict_filenames: true,
        };

        let reporter = self.reporter.clone();
        let job_id = task.job_id.clone();
        let on_progress = move |event: ProgressEvent| {
            reporter.report(&event.with_job_id(job_id.as_str()));
        };

        debug!(
            job_id = %task.job_id,
            engine = self.engine.name(),
            format = %task.format,
            headers = task.headers.len(),
            "Starting engine"
        );
        let extracted = self.engine.extract(&request, &on_progress).await?;

        // The engine is done; make sure the job reflects that before checking output.
        if self.store.get(&task.job_id)?.state != JobState::Processing {
            self.store.update(
                &task.job_id,
                JobUpdate::new()
                    .state(JobState::Processing)
                    .progress(100.0)
                    .info(PROCESSING_INFO),
            )?;
        }

        let expected = extracted.expected_filenames();
        let files = find_output_files(&self.download_dir, &expected).await?;
        if files.is_empty() {
            debug!(job_id = %task.job_id, ?expected, "No expected output present");
            return Err(DownloadError::MissingOutput);
        }
        Ok(files)
    }
}

/// Keeps the expected names that exist in `dir`, in order, without duplicates.
async fn find_output_files(dir: &Path, expected: &[String]) -> Result<Vec<String>, DownloadError> {
    let list_err = |source: std::io::Error| DownloadError::ListOutput {
        path: dir.to_path_buf(),
        source,
    };

    let mut present = HashSet::new();
    let mut entries = tokio::fs::read_dir(dir).await.map_err(list_err)?;
    while let Some(entry) = entries.next_entry().await.map_err(list_err)? {
        if let Some(name) = entry.file_name().to_str() {
            present.insert(name.to_string());
        }
    }

    let mut seen = HashSet::new();
    let mut files = Vec::new();
    for name in expected {
        if present.contains(name) && seen.insert(name) {
            files.push(name.clone());
        }
    }
    Ok(files)
}
