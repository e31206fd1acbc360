//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Job submission and outcomes
//! - Download workers (in flight, duration)
//! - Engine progress events

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts};

// =============================================================================
// Jobs
// =============================================================================

/// Jobs submitted total by quality.
pub static JOBS_SUBMITTED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("linxgo_jobs_submitted_total", "Total download jobs submitted"),
        &["quality"], // "high", "medium", "low", "audio"
    )
    .unwrap()
});

/// Jobs that reached `finished`.
pub static JOBS_FINISHED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "linxgo_jobs_finished_total",
        "Total jobs that finished with output files",
    )
    .unwrap()
});

/// Jobs that reached `error`.
pub static JOBS_FAILED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("linxgo_jobs_failed_total", "Total jobs that failed").unwrap()
});

// =============================================================================
// Downloads
// =============================================================================

/// Workers currently running.
pub static DOWNLOADS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("linxgo_downloads_active", "Download workers currently running").unwrap()
});

/// Worker duration in seconds.
pub static DOWNLOAD_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new("linxgo_download_duration_seconds", "Duration of downloads").buckets(
            vec![1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1800.0, 3600.0],
        ),
        &["result"], // "success", "failed"
    )
    .unwrap()
});

/// Engine progress events applied to jobs.
pub static PROGRESS_EVENTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "linxgo_progress_events_total",
            "Total engine progress events handled",
        ),
        &["status"], // "downloading", "finished"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Jobs
        Box::new(JOBS_SUBMITTED.clone()),
        Box::new(JOBS_FINISHED.clone()),
        Box::new(JOBS_FAILED.clone()),
        // Downloads
        Box::new(DOWNLOADS_ACTIVE.clone()),
        Box::new(DOWNLOAD_DURATION.clone()),
        Box::new(PROGRESS_EVENTS.clone()),
    ]
}
