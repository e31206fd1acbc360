//! Mock engine for testing.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::engine::{
    Engine, EngineError, EngineRequest, ExtractedInfo, ProgressEvent, DEFAULT_EXTENSION,
};

/// What the next `extract` calls return.
#[derive(Debug, Clone)]
enum Outcome {
    Success(ExtractedInfo),
    Failure(String),
}

/// Mock implementation of the Engine trait.
///
/// Provides controllable behavior for testing:
/// - Record every request for assertions
/// - Replay a scripted sequence of progress events
/// - Simulate success (optionally writing the expected files) or failure
/// - Simulate a slow engine
///
/// # Example
///
/// ```rust,ignore
/// use linxgo_core::testing::MockEngine;
///
/// let engine = MockEngine::new();
/// engine.succeed_with(ExtractedInfo::item("abc", "mp4")).await;
/// engine.set_events(vec![ProgressEvent::downloading(50, Some(100))]).await;
///
/// // ... run a job ...
///
/// let requests = engine.recorded_requests().await;
/// assert_eq!(requests.len(), 1);
/// ```
#[derive(Debug)]
pub struct MockEngine {
    /// Recorded requests.
    requests: Arc<RwLock<Vec<EngineRequest>>>,
    /// Events replayed through the progress callback.
    events: Arc<RwLock<Vec<ProgressEvent>>>,
    outcome: Arc<RwLock<Outcome>>,
    /// Whether a successful run creates the expected files.
    write_files: Arc<RwLock<bool>>,
    /// Simulated work before events are replayed.
    delay: Arc<RwLock<Duration>>,
}

impl Default for MockEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEngine {
    /// Create a mock that succeeds with a single `mock.mp4` item.
    pub fn new() -> Self {
        Self {
            requests: Arc::new(RwLock::new(Vec::new())),
            events: Arc::new(RwLock::new(Vec::new())),
            outcome: Arc::new(RwLock::new(Outcome::Success(ExtractedInfo::item(
                "mock", "mp4",
            )))),
            write_files: Arc::new(RwLock::new(true)),
            delay: Arc::new(RwLock::new(Duration::ZERO)),
        }
    }

    /// Get all recorded requests.
    pub async fn recorded_requests(&self) -> Vec<EngineRequest> {
        self.requests.read().await.clone()
    }

    /// Succeed with the given metadata.
    pub async fn succeed_with(&self, info: ExtractedInfo) {
        *self.outcome.write().await = Outcome::Success(info);
    }

    /// Fail with the given message.
    pub async fn fail_with(&self, message: impl Into<String>) {
        *self.outcome.write().await = Outcome::Failure(message.into());
    }

    /// Set the progress events replayed on every run.
    pub async fn set_events(&self, events: Vec<ProgressEvent>) {
        *self.events.write().await = events;
    }

    /// Enable or disable writing the expected files on success.
    pub async fn set_write_files(&self, write: bool) {
        *self.write_files.write().await = write;
    }

    /// Set the simulated engine run time.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = delay;
    }
}

#[async_trait]
impl Engine for MockEngine {
    fn name(&self) -> &str {
        "mock"
    }

    async fn extract(
        &self,
        request: &EngineRequest,
        on_progress: &(dyn Fn(ProgressEvent) + Send + Sync),
    ) -> Result<ExtractedInfo, EngineError> {
        self.requests.write().await.push(request.clone());

        let delay = *self.delay.read().await;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let events = self.events.read().await.clone();
        for event in events {
            on_progress(event);
        }

        let outcome = self.outcome.read().await.clone();
        match outcome {
            Outcome::Failure(message) => Err(EngineError::failed(message)),
            Outcome::Success(info) => {
                if *self.write_files.read().await {
                    for name in rendered_filenames(&request.output_template, &info) {
                        tokio::fs::write(request.output_dir.join(name), b"").await?;
                    }
                }
                Ok(info)
            }
        }
    }

    async fn validate(&self) -> Result<(), EngineError> {
        Ok(())
    }
}

/// Names the files the way yt-dlp would, from the request's output template.
fn rendered_filenames(template: &str, info: &ExtractedInfo) -> Vec<String> {
    let items: Vec<&ExtractedInfo> = match &info.entries {
        Some(entries) => entries.iter().flatten().collect(),
        None => vec![info],
    };
    items
        .into_iter()
        .filter_map(|item| {
            let id = item.id.as_deref()?;
            let ext = item
                .ext
                .as_deref()
                .filter(|e| !e.is_empty())
                .unwrap_or(DEFAULT_EXTENSION);
            Some(template.replace("%(id)s", id).replace("%(ext)s", ext))
        })
        .collect()
}
