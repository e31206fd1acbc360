//! Job storage trait and error type.

use std::collections::HashMap;
use thiserror::Error;

use crate::download::Quality;
use crate::job::{Job, JobState, JobUpdate};

/// Errors returned by a [`JobStore`].
#[derive(Debug, Error, PartialEq)]
pub enum JobError {
    /// No job with this id.
    #[error("Job not found: {0}")]
    NotFound(String),

    /// A job with this id already exists.
    #[error("Job already exists: {0}")]
    AlreadyExists(String),

    /// The update would move the job backwards or out of a terminal state.
    #[error("Cannot move job {job_id} from {from} to {to}")]
    InvalidTransition {
        job_id: String,
        from: JobState,
        to: JobState,
    },

    /// The update would break a field invariant.
    #[error("Invalid update for job {job_id}: {reason}")]
    InvalidUpdate { job_id: String, reason: String },
}

/// Process-wide mapping from job id to job record.
///
/// Each job has a single writer (its download worker) and any number of
/// readers, so implementations only need map-level thread safety.
pub trait JobStore: Send + Sync {
    /// Create a queued job. Fails if the id is already present.
    fn create(&self, id: &str, url: &str, quality: Quality) -> Result<Job, JobError>;

    /// Merge `update` into the job and return the new snapshot.
    fn update(&self, id: &str, update: JobUpdate) -> Result<Job, JobError>;

    /// Get a snapshot of a job.
    fn get(&self, id: &str) -> Result<Job, JobError>;

    /// All jobs, newest first.
    fn list(&self) -> Vec<Job>;

    /// Number of jobs per state.
    fn count_by_state(&self) -> HashMap<JobState, usize> {
        let mut counts = HashMap::new();
        for job in self.list() {
            *counts.entry(job.state).or_insert(0) += 1;
        }
        counts
    }
}
