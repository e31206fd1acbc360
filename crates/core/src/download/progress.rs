//! Translates engine progress events into job updates.

use std::sync::Arc;
use tracing::debug;

use crate::engine::{ProgressEvent, ProgressStatus};
use crate::job::{JobState, JobStore, JobUpdate};
use crate::metrics::PROGRESS_EVENTS;

/// Info shown once the engine reports a transfer as finished.
pub const PROCESSING_INFO: &str = "Processing file.";

/// Adapter invoked by the engine's progress callback.
///
/// Runs inline on the download task, so it only touches the in-memory store
/// and never fails: events for missing or unknown jobs and events the store
/// rejects are dropped.
#[derive(Clone)]
pub struct ProgressReporter {
    store: Arc<dyn JobStore>,
}

impl ProgressReporter {
    pub fn new(store: Arc<dyn JobStore>) -> Self {
        Self { store }
    }

    /// Applies one engine event to its job.
    pub fn report(&self, event: &ProgressEvent) {
        let Some(job_id) = event.job_id.as_deref() else {
            return;
        };
        let Ok(job) = self.store.get(job_id) else {
            return;
        };
        if job.is_terminal() {
            return;
        }

        let update = match event.status {
            ProgressStatus::Downloading => {
                PROGRESS_EVENTS.with_label_values(&["downloading"]).inc();
                let mut progress = compute_progress(event);
                if job.state == JobState::Downloading {
                    progress = progress.max(job.progress);
                }
                let info = downloading_info(progress, event.eta, event.speed);
                if job.state == JobState::Processing {
                    // Next playlist item: keep the state, show the transfer.
                    JobUpdate::new().progress(progress).info(info)
                } else {
                    JobUpdate::new()
                        .state(JobState::Downloading)
                        .progress(progress)
                        .info(info)
                }
            }
            ProgressStatus::Finished => {
                PROGRESS_EVENTS.with_label_values(&["finished"]).inc();
                JobUpdate::new()
                    .state(JobState::Processing)
                    .progress(100.0)
                    .info(PROCESSING_INFO)
            }
            ProgressStatus::Other(_) => return,
        };

        if let Err(e) = self.store.update(job_id, update) {
            debug!(job_id, error = %e, "Dropped progress update");
        }
    }
}

/// Percentage downloaded, `0` when no total or estimate is known.
pub fn compute_progress(event: &ProgressEvent) -> f64 {
    match event.total() {
        Some(total) if total > 0 => {
            (event.downloaded_bytes as f64 / total as f64 * 100.0).clamp(0.0, 100.0)
        }
        _ => 0.0,
    }
}

/// Status line for a transfer in progress. A zero ETA or speed reads as unknown.
pub fn downloading_info(progress: f64, eta: Option<u64>, speed: Option<f64>) -> String {
    let eta = match eta.filter(|&secs| secs > 0) {
        Some(secs) => format!("ETA: {} sec", secs),
        None => "ETA: calculating...".to_string(),
    };
    let speed = match speed.filter(|&bytes_per_sec| bytes_per_sec > 0.0) {
        Some(bytes_per_sec) => format!("Speed: {:.2} KB/s", bytes_per_sec / 1024.0),
        None => "Speed: calculating...".to_string(),
    };
    format!("Downloading... {:.2}% ({}, {})", progress, eta, speed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::Quality;
    use crate::job::InMemoryJobStore;

    fn setup() -> (Arc<InMemoryJobStore>, ProgressReporter) {
        let store = Arc::new(InMemoryJobStore::new());
        store.create("job", "https://example.com/v", Quality::High).unwrap();
        store
            .update("job", JobUpdate::new().state(JobState::Starting).progress(0.0))
            .unwrap();
        let reporter = ProgressReporter::new(store.clone());
        (store, reporter)
    }

    #[test]
    fn test_compute_progress_exact_total() {
        let event = ProgressEvent::downloading(50, Some(200));
        assert_eq!(compute_progress(&event), 25.0);
    }

    #[test]
    fn test_compute_progress_uses_estimate() {
        let event = ProgressEvent::downloading(30, None).with_estimate(120);
        assert_eq!(compute_progress(&event), 25.0);
    }

    #[test]
    fn test_compute_progress_unknown_total() {
        assert_eq!(compute_progress(&ProgressEvent::downloading(500, None)), 0.0);
        assert_eq!(compute_progress(&ProgressEvent::downloading(500, Some(0))), 0.0);
    }

    #[test]
    fn test_compute_progress_is_capped() {
        let event = ProgressEvent::downloading(300, None).with_estimate(200);
        assert_eq!(compute_progress(&event), 100.0);
    }

    #[test]
    fn test_downloading_info_format() {
        assert_eq!(
            downloading_info(25.0, Some(12), Some(2048.0)),
            "Downloading... 25.00% (ETA: 12 sec, Speed: 2.00 KB/s)"
        );
        assert_eq!(
            downloading_info(0.0, None, None),
            "Downloading... 0.00% (ETA: calculating..., Speed: calculating...)"
        );
    }

    #[test]
    fn test_downloading_info_zero_eta_and_speed_are_unknown() {
        assert_eq!(
            downloading_info(10.0, Some(0), Some(0.0)),
            "Downloading... 10.00% (ETA: calculating..., Speed: calculating...)"
        );
        assert_eq!(
            downloading_info(10.0, Some(1), Some(512.0)),
            "Downloading... 10.00% (ETA: 1 sec, Speed: 0.50 KB/s)"
        );
    }

    #[test]
    fn test_downloading_event_updates_job() {
        let (store, reporter) = setup();
        reporter.report(
            &ProgressEvent::downloading(50, Some(200))
                .with_eta(3)
                .with_speed(1024.0)
                .with_job_id("job"),
        );
        let job = store.get("job").unwrap();
        assert_eq!(job.state, JobState::Downloading);
        assert_eq!(job.progress, 25.0);
        assert_eq!(job.info, "Downloading... 25.00% (ETA: 3 sec, Speed: 1.00 KB/s)");
    }

    #[test]
    fn test_unknown_total_still_sets_downloading() {
        let (store, reporter) = setup();
        reporter.report(&ProgressEvent::downloading(10, None).with_job_id("job"));
        let job = store.get("job").unwrap();
        assert_eq!(job.state, JobState::Downloading);
        assert_eq!(job.progress, 0.0);
    }

    #[test]
    fn test_finished_event_moves_to_processing() {
        let (store, reporter) = setup();
        reporter.report(&ProgressEvent::downloading(10, Some(100)).with_job_id("job"));
        reporter.report(&ProgressEvent::finished().with_job_id("job"));
        let job = store.get("job").unwrap();
        assert_eq!(job.state, JobState::Processing);
        assert_eq!(job.progress, 100.0);
        assert_eq!(job.info, PROCESSING_INFO);
    }

    #[test]
    fn test_unknown_or_missing_job_id_is_ignored() {
        let (store, reporter) = setup();
        let before = store.get("job").unwrap();

        reporter.report(&ProgressEvent::downloading(50, Some(200)).with_job_id("other"));
        reporter.report(&ProgressEvent::downloading(50, Some(200)));

        assert_eq!(store.get("job").unwrap(), before);
        assert_eq!(store.list().len(), 1);
    }

    #[test]
    fn test_other_status_is_ignored() {
        let (store, reporter) = setup();
        let before = store.get("job").unwrap();
        reporter.report(&ProgressEvent::other("error").with_job_id("job"));
        assert_eq!(store.get("job").unwrap(), before);
    }

    #[test]
    fn test_progress_never_decreases_while_downloading() {
        let (store, reporter) = setup();
        reporter.report(&ProgressEvent::downloading(80, Some(100)).with_job_id("job"));
        reporter.report(&ProgressEvent::downloading(20, Some(100)).with_job_id("job"));
        let job = store.get("job").unwrap();
        assert_eq!(job.progress, 80.0);
        assert!(job.info.starts_with("Downloading... 80.00%"));
    }

    #[test]
    fn test_next_playlist_item_keeps_processing_state() {
        let (store, reporter) = setup();
        reporter.report(&ProgressEvent::downloading(100, Some(100)).with_job_id("job"));
        reporter.report(&ProgressEvent::finished().with_job_id("job"));
        reporter.report(&ProgressEvent::downloading(5, Some(100)).with_job_id("job"));

        let job = store.get("job").unwrap();
        assert_eq!(job.state, JobState::Processing);
        assert_eq!(job.progress, 5.0);
        assert!(job.info.starts_with("Downloading... 5.00%"));
    }

    #[test]
    fn test_terminal_job_is_not_touched() {
        let (store, reporter) = setup();
        store.update("job", JobUpdate::error("network timeout")).unwrap();
        reporter.report(&ProgressEvent::downloading(50, Some(100)).with_job_id("job"));
        let job = store.get("job").unwrap();
        assert_eq!(job.state, JobState::Error);
        assert_eq!(job.info, "network timeout");
    }
}
