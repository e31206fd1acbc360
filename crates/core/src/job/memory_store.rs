//! In-memory job store guarded by a single lock.

use chrono::Utc;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::download::Quality;
use crate::job::{Job, JobError, JobState, JobStore, JobUpdate};

/// Job store backed by a `HashMap` behind one `RwLock`.
///
/// Jobs live for the lifetime of the process.
#[derive(Debug, Default)]
pub struct InMemoryJobStore {
    jobs: RwLock<HashMap<String, Job>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies `update` to `job` after checking the lifecycle invariants.
    fn apply(job: &mut Job, update: JobUpdate) -> Result<(), JobError> {
        let next_state = update.state.unwrap_or(job.state);

        if update.state.is_some() && !job.state.can_transition_to(next_state) {
            return Err(JobError::InvalidTransition {
                job_id: job.id.clone(),
                from: job.state,
                to: next_state,
            });
        }
        if job.state.is_terminal() {
            // Field-only updates on a terminal job are rejected as well.
            return Err(JobError::InvalidTransition {
                job_id: job.id.clone(),
                from: job.state,
                to: next_state,
            });
        }

        let next_files = update.files.as_ref().unwrap_or(&job.files);
        if next_state == JobState::Finished && next_files.is_empty() {
            return Err(JobError::InvalidUpdate {
                job_id: job.id.clone(),
                reason: "finished job must list at least one file".to_string(),
            });
        }
        if next_state != JobState::Finished && !next_files.is_empty() {
            return Err(JobError::InvalidUpdate {
                job_id: job.id.clone(),
                reason: format!("files can only be set when finished, not {}", next_state),
            });
        }

        if let Some(progress) = update.progress {
            if !(0.0..=100.0).contains(&progress) {
                return Err(JobError::InvalidUpdate {
                    job_id: job.id.clone(),
                    reason: format!("progress {} out of range", progress),
                });
            }
            if job.state == JobState::Downloading
                && next_state == JobState::Downloading
                && progress < job.progress
            {
                return Err(JobError::InvalidUpdate {
                    job_id: job.id.clone(),
                    reason: format!(
                        "progress cannot go from {:.2} back to {:.2} while downloading",
                        job.progress, progress
                    ),
                });
            }
        }

        job.state = next_state;
        if let Some(progress) = update.progress {
            job.progress = progress;
        }
        if let Some(info) = update.info {
            job.info = info;
        }
        if let Some(files) = update.files {
            job.files = files;
        }
        job.updated_at = Utc::now();
        Ok(())
    }
}

impl JobStore for InMemoryJobStore {
    fn create(&self, id: &str, url: &str, quality: Quality) -> Result<Job, JobError> {
        let mut jobs = self.jobs.write().unwrap_or_else(|e| e.into_inner());
        if jobs.contains_key(id) {
            return Err(JobError::AlreadyExists(id.to_string()));
        }
        let job = Job::queued(id, url, quality);
        jobs.insert(id.to_string(), job.clone());
        Ok(job)
    }

    fn update(&self, id: &str, update: JobUpdate) -> Result<Job, JobError> {
        let mut jobs = self.jobs.write().unwrap_or_else(|e| e.into_inner());
        let job = jobs
            .get_mut(id)
            .ok_or_else(|| JobError::NotFound(id.to_string()))?;
        Self::apply(job, update)?;
        Ok(job.clone())
    }

    fn get(&self, id: &str) -> Result<Job, JobError> {
        let jobs = self.jobs.read().unwrap_or_else(|e| e.into_inner());
        jobs.get(id)
            .cloned()
            .ok_or_else(|| JobError::NotFound(id.to_string()))
    }

    fn list(&self) -> Vec<Job> {
        let jobs = self.jobs.read().unwrap_or_else(|e| e.into_inner());
        let mut all: Vec<Job> = jobs.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        all
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_job(id: &str) -> InMemoryJobStore {
        let store = InMemoryJobStore::new();
        store
            .create(id, "https://example.com/watch?v=1", Quality::High)
            .unwrap();
        store
    }

    #[test]
    fn test_create_and_get() {
        let store = store_with_job("j1");
        let job = store.get("j1").unwrap();
        assert_eq!(job.url, "https://example.com/watch?v=1");
        assert_eq!(job.state, JobState::Queued);
    }

    #[test]
    fn test_create_duplicate_fails() {
        let store = store_with_job("j1");
        let err = store.create("j1", "https://other", Quality::Low).unwrap_err();
        assert_eq!(err, JobError::AlreadyExists("j1".to_string()));
        // Original record untouched
        assert_eq!(store.get("j1").unwrap().quality, Quality::High);
    }

    #[test]
    fn test_get_missing() {
        let store = InMemoryJobStore::new();
        assert_eq!(
            store.get("nope").unwrap_err(),
            JobError::NotFound("nope".to_string())
        );
    }

    #[test]
    fn test_update_missing() {
        let store = InMemoryJobStore::new();
        let err = store
            .update("nope", JobUpdate::new().state(JobState::Starting))
            .unwrap_err();
        assert!(matches!(err, JobError::NotFound(_)));
    }

    #[test]
    fn test_update_merges_only_given_fields() {
        let store = store_with_job("j1");
        store
            .update(
                "j1",
                JobUpdate::new()
                    .state(JobState::Starting)
                    .info("Preparing download..."),
            )
            .unwrap();
        let job = store
            .update("j1", JobUpdate::new().state(JobState::Downloading).progress(10.0))
            .unwrap();
        assert_eq!(job.state, JobState::Downloading);
        assert_eq!(job.progress, 10.0);
        assert_eq!(job.info, "Preparing download...");
        assert_eq!(job.url, "https://example.com/watch?v=1");
    }

    #[test]
    fn test_update_rejects_regression() {
        let store = store_with_job("j1");
        store
            .update("j1", JobUpdate::new().state(JobState::Starting))
            .unwrap();
        store
            .update("j1", JobUpdate::new().state(JobState::Processing))
            .unwrap();
        let err = store
            .update("j1", JobUpdate::new().state(JobState::Downloading))
            .unwrap_err();
        assert!(matches!(
            err,
            JobError::InvalidTransition {
                from: JobState::Processing,
                to: JobState::Downloading,
                ..
            }
        ));
        assert_eq!(store.get("j1").unwrap().state, JobState::Processing);
    }

    #[test]
    fn test_queued_cannot_jump_to_finished() {
        let store = store_with_job("j1");
        let err = store
            .update(
                "j1",
                JobUpdate::new()
                    .state(JobState::Finished)
                    .files(vec!["a.mp4".to_string()]),
            )
            .unwrap_err();
        assert!(matches!(err, JobError::InvalidTransition { .. }));
    }

    #[test]
    fn test_finished_requires_files() {
        let store = store_with_job("j1");
        store
            .update("j1", JobUpdate::new().state(JobState::Starting))
            .unwrap();
        store
            .update("j1", JobUpdate::new().state(JobState::Processing))
            .unwrap();
        let err = store
            .update("j1", JobUpdate::new().state(JobState::Finished))
            .unwrap_err();
        assert!(matches!(err, JobError::InvalidUpdate { .. }));

        let job = store
            .update(
                "j1",
                JobUpdate::new()
                    .state(JobState::Finished)
                    .files(vec!["a.mp4".to_string()]),
            )
            .unwrap();
        assert_eq!(job.files, vec!["a.mp4"]);
    }

    #[test]
    fn test_files_only_when_finished() {
        let store = store_with_job("j1");
        let err = store
            .update("j1", JobUpdate::new().files(vec!["a.mp4".to_string()]))
            .unwrap_err();
        assert!(matches!(err, JobError::InvalidUpdate { .. }));
    }

    #[test]
    fn test_progress_monotonic_while_downloading() {
        let store = store_with_job("j1");
        store
            .update("j1", JobUpdate::new().state(JobState::Starting))
            .unwrap();
        store
            .update("j1", JobUpdate::new().state(JobState::Downloading).progress(40.0))
            .unwrap();
        let err = store
            .update("j1", JobUpdate::new().state(JobState::Downloading).progress(30.0))
            .unwrap_err();
        assert!(matches!(err, JobError::InvalidUpdate { .. }));
        assert_eq!(store.get("j1").unwrap().progress, 40.0);
    }

    #[test]
    fn test_progress_out_of_range() {
        let store = store_with_job("j1");
        let err = store
            .update("j1", JobUpdate::new().progress(101.0))
            .unwrap_err();
        assert!(matches!(err, JobError::InvalidUpdate { .. }));
    }

    #[test]
    fn test_terminal_job_is_frozen() {
        let store = store_with_job("j1");
        store.update("j1", JobUpdate::error("boom")).unwrap();
        let err = store.update("j1", JobUpdate::new().info("late")).unwrap_err();
        assert!(matches!(err, JobError::InvalidTransition { .. }));
        assert_eq!(store.get("j1").unwrap().info, "boom");
    }

    #[test]
    fn test_list_and_count() {
        let store = InMemoryJobStore::new();
        store.create("a", "https://a", Quality::High).unwrap();
        store.create("b", "https://b", Quality::Audio).unwrap();
        store.update("b", JobUpdate::error("failed")).unwrap();

        assert_eq!(store.list().len(), 2);
        let counts = store.count_by_state();
        assert_eq!(counts.get(&JobState::Queued), Some(&1));
        assert_eq!(counts.get(&JobState::Error), Some(&1));
        assert_eq!(counts.get(&JobState::Finished), None);
    }
}
