//! Server-sent progress events for one job

use crate::AppState;
use analyst_jobs::progress_stream;
use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::{Stream, StreamExt};
use std::sync::Arc;
use tracing::debug;

/// `GET /api/jobs/:id/stream`
///
/// Event names follow [`ProgressEvent::name`](analyst_jobs::ProgressEvent::name).
/// The stream ends after the terminal event; dropping the connection stops
/// polling but leaves the job running.
pub async fn stream_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    debug!("Progress stream opened for job {}", job_id);
    let events = progress_stream(Arc::clone(state.store()), job_id, state.stream)
        .map(|event| Event::default().event(event.name()).json_data(&event));
    Sse::new(events).keep_alive(KeepAlive::default())
}
