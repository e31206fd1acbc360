//! Job API handlers.

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderValue, Request, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower::ServiceExt;
use tower_http::services::ServeFile;
use tracing::warn;
use linxgo_core::{Job, JobError, JobState, Quality};

use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for submitting a download
#[derive(Debug, Deserialize)]
pub struct CreateJobBody {
    /// Media page URL; blank input is ignored
    #[serde(default)]
    pub url: String,
    /// Quality preset, `high` when omitted
    #[serde(default)]
    pub quality: Quality,
}

/// Response for job operations
#[derive(Debug, Serialize)]
pub struct JobResponse {
    pub id: String,
    pub url: String,
    pub quality: Quality,
    pub state: JobState,
    pub progress: f64,
    pub info: String,
    pub files: Vec<String>,
    /// API paths of the finished files, parallel to `files`
    pub download_urls: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Job> for JobResponse {
    fn from(job: Job) -> Self {
        let download_urls = job
            .files
            .iter()
            .map(|name| format!("/api/v1/jobs/{}/files/{}", job.id, name))
            .collect();
        Self {
            id: job.id,
            url: job.url,
            quality: job.quality,
            state: job.state,
            progress: job.progress,
            info: job.info,
            files: job.files,
            download_urls,
            created_at: job.created_at,
            updated_at: job.updated_at,
        }
    }
}

/// Response for listing jobs
#[derive(Debug, Serialize)]
pub struct ListJobsResponse {
    pub jobs: Vec<JobResponse>,
    pub total: usize,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub(crate) fn job_error(e: JobError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match e {
        JobError::NotFound(_) => StatusCode::NOT_FOUND,
        JobError::AlreadyExists(_) => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// Submit a download. Blank URLs are ignored with 204.
pub async fn create_job(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateJobBody>,
) -> Response {
    match state.service().submit(&body.url, body.quality) {
        Ok(Some(job)) => (StatusCode::ACCEPTED, Json(JobResponse::from(job))).into_response(),
        Ok(None) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => job_error(e).into_response(),
    }
}

/// List all jobs, newest first
pub async fn list_jobs(State(state): State<Arc<AppState>>) -> Json<ListJobsResponse> {
    let jobs: Vec<JobResponse> = state
        .job_store()
        .list()
        .into_iter()
        .map(JobResponse::from)
        .collect();
    Json(ListJobsResponse {
        total: jobs.len(),
        jobs,
    })
}

/// Get a job snapshot
pub async fn get_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<JobResponse>, (StatusCode, Json<ErrorResponse>)> {
    state
        .job_store()
        .get(&id)
        .map(|job| Json(JobResponse::from(job)))
        .map_err(job_error)
}

/// Serve one of a finished job's files as an attachment
pub async fn download_file(
    State(state): State<Arc<AppState>>,
    Path((id, name)): Path<(String, String)>,
    request: Request<Body>,
) -> Result<Response, (StatusCode, Json<ErrorResponse>)> {
    let job = state.job_store().get(&id).map_err(job_error)?;

    let is_plain_name = !name.contains(['/', '\\']) && name != ".." && name != ".";
    if !is_plain_name || !job.files.contains(&name) {
        return Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("File not found for job {}: {}", id, name),
            }),
        ));
    }

    let path = state.download_dir().join(&name);
    let mut response = match ServeFile::new(&path).oneshot(request).await {
        Ok(response) => response.map(Body::new),
        Err(never) => match never {},
    };

    match HeaderValue::from_str(&format!("attachment; filename=\"{}\"", name)) {
        Ok(value) => {
            response.headers_mut().insert(header::CONTENT_DISPOSITION, value);
        }
        Err(e) => warn!(file = %name, error = %e, "Cannot build Content-Disposition"),
    }

    Ok(response)
}
