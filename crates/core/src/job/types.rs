//! Core job data types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::download::Quality;

/// Lifecycle state of a download job.
///
/// States only move forward. `Finished` and `Error` are terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Accepted, worker not yet running.
    Queued,
    /// Worker is configuring the engine.
    Starting,
    /// Engine is transferring data.
    Downloading,
    /// Engine finished a transfer and may still be post-processing.
    Processing,
    /// Output files are available.
    Finished,
    /// The job failed; `info` holds the reason.
    Error,
}

impl JobState {
    /// All states, in lifecycle order.
    pub const ALL: [JobState; 6] = [
        JobState::Queued,
        JobState::Starting,
        JobState::Downloading,
        JobState::Processing,
        JobState::Finished,
        JobState::Error,
    ];

    /// Returns the state name as used in the API.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Queued => "queued",
            JobState::Starting => "starting",
            JobState::Downloading => "downloading",
            JobState::Processing => "processing",
            JobState::Finished => "finished",
            JobState::Error => "error",
        }
    }

    /// Whether no further transitions can occur.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Finished | JobState::Error)
    }

    /// Whether a job in this state may move to `next`.
    ///
    /// Self-transitions are allowed for the two in-flight states so that
    /// repeated progress updates are accepted.
    pub fn can_transition_to(&self, next: JobState) -> bool {
        use JobState::*;
        match (self, next) {
            (Queued, Starting) | (Queued, Error) => true,
            (Starting, Downloading) | (Starting, Processing) | (Starting, Error) => true,
            (Downloading, Downloading) | (Downloading, Processing) | (Downloading, Error) => true,
            (Processing, Processing) | (Processing, Finished) | (Processing, Error) => true,
            _ => false,
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single user-initiated download and its tracked state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Job {
    /// Unique identifier (UUID v4).
    pub id: String,
    /// Original source URL. Never changes after creation.
    pub url: String,
    /// Quality preset chosen at submission.
    pub quality: Quality,
    /// Current lifecycle state.
    pub state: JobState,
    /// Percentage in [0, 100].
    pub progress: f64,
    /// Human-readable status line.
    pub info: String,
    /// Output filenames, populated only when finished.
    pub files: Vec<String>,
    /// When the job was created.
    pub created_at: DateTime<Utc>,
    /// When the job was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Creates a freshly queued job.
    pub fn queued(id: impl Into<String>, url: impl Into<String>, quality: Quality) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            url: url.into(),
            quality,
            state: JobState::Queued,
            progress: 0.0,
            info: "Queued".to_string(),
            files: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the job reached `finished` or `error`.
    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }
}

/// Partial update merged into an existing job.
///
/// Only fields that are `Some` replace the stored values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobUpdate {
    pub state: Option<JobState>,
    pub progress: Option<f64>,
    pub info: Option<String>,
    pub files: Option<Vec<String>>,
}

impl JobUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(mut self, state: JobState) -> Self {
        self.state = Some(state);
        self
    }

    pub fn progress(mut self, progress: f64) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn info(mut self, info: impl Into<String>) -> Self {
        self.info = Some(info.into());
        self
    }

    pub fn files(mut self, files: Vec<String>) -> Self {
        self.files = Some(files);
        self
    }

    /// Shorthand for a terminal failure with the given reason.
    pub fn error(reason: impl Into<String>) -> Self {
        Self::new().state(JobState::Error).info(reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queued_job_defaults() {
        let job = Job::queued("job-1", "https://example.com/v", Quality::High);
        assert_eq!(job.state, JobState::Queued);
        assert_eq!(job.progress, 0.0);
        assert_eq!(job.info, "Queued");
        assert!(job.files.is_empty());
        assert!(!job.is_terminal());
    }

    #[test]
    fn test_terminal_states() {
        assert!(JobState::Finished.is_terminal());
        assert!(JobState::Error.is_terminal());
        assert!(!JobState::Processing.is_terminal());
        assert!(!JobState::Queued.is_terminal());
    }

    #[test]
    fn test_transitions_only_move_forward() {
        assert!(JobState::Queued.can_transition_to(JobState::Starting));
        assert!(JobState::Starting.can_transition_to(JobState::Downloading));
        assert!(JobState::Downloading.can_transition_to(JobState::Downloading));
        assert!(JobState::Downloading.can_transition_to(JobState::Processing));
        assert!(JobState::Processing.can_transition_to(JobState::Finished));

        assert!(!JobState::Queued.can_transition_to(JobState::Finished));
        assert!(!JobState::Queued.can_transition_to(JobState::Downloading));
        assert!(!JobState::Processing.can_transition_to(JobState::Downloading));
        assert!(!JobState::Downloading.can_transition_to(JobState::Starting));
        assert!(!JobState::Starting.can_transition_to(JobState::Finished));
    }

    #[test]
    fn test_terminal_states_accept_nothing() {
        for next in JobState::ALL {
            assert!(!JobState::Finished.can_transition_to(next));
            assert!(!JobState::Error.can_transition_to(next));
        }
    }

    #[test]
    fn test_any_live_state_can_fail() {
        for state in [
            JobState::Queued,
            JobState::Starting,
            JobState::Downloading,
            JobState::Processing,
        ] {
            assert!(state.can_transition_to(JobState::Error), "{state}");
        }
    }

    #[test]
    fn test_state_serialization() {
        let json = serde_json::to_string(&JobState::Downloading).unwrap();
        assert_eq!(json, "\"downloading\"");
        let parsed: JobState = serde_json::from_str("\"error\"").unwrap();
        assert_eq!(parsed, JobState::Error);
    }

    #[test]
    fn test_update_builder() {
        let update = JobUpdate::new()
            .state(JobState::Finished)
            .progress(100.0)
            .files(vec!["a.mp4".to_string()]);
        assert_eq!(update.state, Some(JobState::Finished));
        assert_eq!(update.progress, Some(100.0));
        assert!(update.info.is_none());

        let err = JobUpdate::error("boom");
        assert_eq!(err.state, Some(JobState::Error));
        assert_eq!(err.info.as_deref(), Some("boom"));
    }
}
