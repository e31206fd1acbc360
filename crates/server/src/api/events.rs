//! Server-Sent Events stream of job snapshots.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::{Stream, StreamExt};
use serde::Serialize;
use std::convert::Infallible;
use std::sync::Arc;
use tracing::debug;

use super::jobs::{job_error, ErrorResponse, JobResponse};
use crate::state::AppState;

/// Payload of an SSE message.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JobEvent {
    /// Current job snapshot.
    Job(JobResponse),
    /// The job could not be read; the stream ends after this.
    Error { error: String },
}

impl JobEvent {
    fn name(&self) -> &'static str {
        match self {
            JobEvent::Job(_) => "job",
            JobEvent::Error { .. } => "error",
        }
    }

    fn into_sse(self) -> Event {
        let name = self.name();
        Event::default()
            .event(name)
            .json_data(&self)
            .unwrap_or_else(|e| {
                debug!(error = %e, "Failed to encode job event");
                Event::default().event("error").data(e.to_string())
            })
    }
}

/// Stream snapshots of a job until it reaches a terminal state.
///
/// Emits one `job` event per poll interval; the stream closes after the
/// terminal snapshot.
pub async fn job_events(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, (StatusCode, Json<ErrorResponse>)>
{
    state.job_store().get(&id).map_err(job_error)?;

    let stream = state.poller().watch(&id).map(|snapshot| {
        let event = match snapshot {
            Ok(job) => JobEvent::Job(JobResponse::from(job)),
            Err(e) => JobEvent::Error {
                error: e.to_string(),
            },
        };
        Ok(event.into_sse())
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
