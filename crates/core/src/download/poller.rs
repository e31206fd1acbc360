//! Periodic job status observation.

use futures::stream::{self, Stream, StreamExt};
use std::sync::Arc;
use std::time::Duration;

use crate::job::{Job, JobError, JobStore};

/// Default delay between two snapshots.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Reads a job at a fixed interval until it reaches a terminal state.
#[derive(Clone)]
pub struct StatusPoller {
    store: Arc<dyn JobStore>,
    interval: Duration,
}

enum PollState {
    First,
    Polling,
    Done,
}

impl StatusPoller {
    pub fn new(store: Arc<dyn JobStore>, interval: Duration) -> Self {
        Self { store, interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Snapshots of job `id`: one immediately, then one per interval.
    ///
    /// The stream ends after yielding the first terminal snapshot, or after
    /// yielding an error if the job cannot be read.
    pub fn watch(&self, id: &str) -> impl Stream<Item = Result<Job, JobError>> + Send + 'static {
        let store = Arc::clone(&self.store);
        let interval = self.interval;
        let id = id.to_string();

        stream::unfold(PollState::First, move |state| {
            let store = Arc::clone(&store);
            let id = id.clone();
            async move {
                match state {
                    PollState::Done => return None,
                    PollState::Polling => tokio::time::sleep(interval).await,
                    PollState::First => {}
                }
                match store.get(&id) {
                    Ok(job) => {
                        let next = if job.is_terminal() {
                            PollState::Done
                        } else {
                            PollState::Polling
                        };
                        Some((Ok(job), next))
                    }
                    Err(e) => Some((Err(e), PollState::Done)),
                }
            }
        })
    }

    /// Renders every snapshot and returns the terminal one.
    pub async fn wait<F>(&self, id: &str, mut render: F) -> Result<Job, JobError>
    where
        F: FnMut(&Job),
    {
        let mut snapshots = Box::pin(self.watch(id));
        let mut last = None;
        while let Some(snapshot) = snapshots.next().await {
            let job = snapshot?;
            render(&job);
            last = Some(job);
        }
        last.ok_or_else(|| JobError::NotFound(id.to_string()))
    }
}
