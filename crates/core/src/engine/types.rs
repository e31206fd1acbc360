//! Types exchanged with an extraction engine.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Extension assumed when the engine does not report one.
pub const DEFAULT_EXTENSION: &str = "mp4";

/// Everything the engine needs for one extract-and-download call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineRequest {
    /// Source page or media URL.
    pub url: String,
    /// Format selector expression (e.g. `best[height<=720]`).
    pub format: String,
    /// Directory the engine writes into.
    pub output_dir: PathBuf,
    /// Filename template relative to `output_dir`, keyed by the engine's item id.
    pub output_template: String,
    /// Extra HTTP headers sent on every engine request. Empty means none.
    pub http_headers: BTreeMap<String, String>,
    /// Suppress engine logging.
    pub quiet: bool,
    /// Expand playlists into their entries.
    pub playlist: bool,
    /// Restrict output filenames to a safe character set.
    pub restrict_filenames: bool,
}

/// Transfer status carried by a progress event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    Downloading,
    Finished,
    /// Anything else the engine reports (e.g. `error`). Not acted upon.
    Other(String),
}

impl ProgressStatus {
    pub fn parse(s: &str) -> Self {
        match s {
            "downloading" => ProgressStatus::Downloading,
            "finished" => ProgressStatus::Finished,
            other => ProgressStatus::Other(other.to_string()),
        }
    }
}

/// Low-level progress event emitted by the engine during a transfer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// Job this event belongs to. Engines leave it unset; the worker's
    /// callback attaches it.
    pub job_id: Option<String>,
    pub status: ProgressStatus,
    pub downloaded_bytes: u64,
    pub total_bytes: Option<u64>,
    pub total_bytes_estimate: Option<u64>,
    /// Seconds remaining.
    pub eta: Option<u64>,
    /// Bytes per second.
    pub speed: Option<f64>,
}

impl ProgressEvent {
    fn with_status(status: ProgressStatus) -> Self {
        Self {
            job_id: None,
            status,
            downloaded_bytes: 0,
            total_bytes: None,
            total_bytes_estimate: None,
            eta: None,
            speed: None,
        }
    }

    /// A `downloading` event with a known or unknown total.
    pub fn downloading(downloaded_bytes: u64, total_bytes: Option<u64>) -> Self {
        Self {
            downloaded_bytes,
            total_bytes,
            ..Self::with_status(ProgressStatus::Downloading)
        }
    }

    /// A `finished` event.
    pub fn finished() -> Self {
        Self::with_status(ProgressStatus::Finished)
    }

    /// An event with an arbitrary status string.
    pub fn other(status: impl Into<String>) -> Self {
        Self::with_status(ProgressStatus::Other(status.into()))
    }

    pub fn with_job_id(mut self, job_id: impl Into<String>) -> Self {
        self.job_id = Some(job_id.into());
        self
    }

    pub fn with_estimate(mut self, total_bytes_estimate: u64) -> Self {
        self.total_bytes_estimate = Some(total_bytes_estimate);
        self
    }

    pub fn with_eta(mut self, eta: u64) -> Self {
        self.eta = Some(eta);
        self
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = Some(speed);
        self
    }

    /// Exact total if known, otherwise the estimate.
    pub fn total(&self) -> Option<u64> {
        self.total_bytes.or(self.total_bytes_estimate)
    }
}

/// Metadata returned by the engine after a successful call.
///
/// Describes either a single item (`id`/`ext`) or a collection (`entries`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedInfo {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub ext: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    /// Playlist entries. Unavailable entries come back as `null`.
    #[serde(default)]
    pub entries: Option<Vec<Option<ExtractedInfo>>>,
}

impl ExtractedInfo {
    /// A single item.
    pub fn item(id: impl Into<String>, ext: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ext: Some(ext.into()),
            ..Default::default()
        }
    }

    /// A collection of items.
    pub fn playlist(id: impl Into<String>, entries: Vec<Option<ExtractedInfo>>) -> Self {
        Self {
            id: Some(id.into()),
            entries: Some(entries),
            ..Default::default()
        }
    }

    pub fn is_playlist(&self) -> bool {
        self.entries.is_some()
    }

    /// `<id>.<ext>` for this item, if it has an id.
    pub fn expected_filename(&self) -> Option<String> {
        let id = self.id.as_deref()?;
        let ext = self
            .ext
            .as_deref()
            .filter(|e| !e.is_empty())
            .unwrap_or(DEFAULT_EXTENSION);
        Some(format!("{}.{}", id, ext))
    }

    /// Filenames the engine should have written, in entry order.
    pub fn expected_filenames(&self) -> Vec<String> {
        match &self.entries {
            Some(entries) => entries
                .iter()
                .flatten()
                .filter_map(|entry| entry.expected_filename())
                .collect(),
            None => self.expected_filename().into_iter().collect(),
        }
    }
}
