use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use super::error::error_response;
use crate::domain::{JobId, JobStatus};
use crate::presentation::state::AppState;

const DEFAULT_FAIL_REASON: &str = "Unknown error";

#[derive(Debug, Deserialize)]
pub struct RegisterJobRequest {
    pub project: String,
    pub total_chunks: i64,
    pub instance_id: String,
}

#[derive(Serialize)]
pub struct RegisterJobResponse {
    pub job_id: JobId,
    pub status: JobStatus,
    pub position: i64,
    pub message: String,
    pub recommended_batch_size: usize,
}

#[derive(Debug, Deserialize)]
pub struct JobProgressRequest {
    pub current: i64,
}

#[derive(Debug, Deserialize)]
pub struct FailJobParams {
    pub error: Option<String>,
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

#[derive(Serialize)]
pub struct ClearRecentResponse {
    pub status: &'static str,
    pub count: usize,
}

#[tracing::instrument(skip(state, request))]
pub async fn register_job_handler(
    State(state): State<AppState>,
    Json(request): Json<RegisterJobRequest>,
) -> impl IntoResponse {
    let (job, position) = state
        .job_queue
        .register(request.project, request.total_chunks, request.instance_id)
        .await;
    let position = position.as_wire();
    let message = if position == 0 {
        "active".to_string()
    } else {
        format!("queued at position {}", position)
    };
    let recommended_batch_size = state
        .batch_policy
        .recommended(&state.embedding_service.memory());

    (
        StatusCode::OK,
        Json(RegisterJobResponse {
            job_id: job.id,
            status: job.status,
            position,
            message,
            recommended_batch_size,
        }),
    )
}

pub async fn list_jobs_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.job_queue.status().await)
}

pub async fn clear_recent_handler(State(state): State<AppState>) -> impl IntoResponse {
    let count = state.job_queue.clear_recent().await;
    Json(ClearRecentResponse {
        status: "cleared",
        count,
    })
}

pub async fn get_job_handler(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Response {
    match state.job_queue.job_detail(&JobId::from(job_id.as_str())).await {
        Some(detail) => Json(detail).into_response(),
        None => job_not_found(&job_id),
    }
}

#[tracing::instrument(skip(state, request))]
pub async fn job_progress_handler(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
    Json(request): Json<JobProgressRequest>,
) -> Response {
    let id = JobId::from(job_id.as_str());
    if state.job_queue.update_progress(&id, request.current).await {
        Json(StatusResponse { status: "ok" }).into_response()
    } else {
        tracing::debug!(current = request.current, "Ignoring stale progress update");
        error_response(
            StatusCode::NOT_FOUND,
            format!("Job {} not found or not active", job_id),
        )
    }
}

#[tracing::instrument(skip(state))]
pub async fn complete_job_handler(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Response {
    if state.job_queue.complete(&JobId::from(job_id.as_str())).await {
        Json(StatusResponse {
            status: "completed",
        })
        .into_response()
    } else {
        job_not_found(&job_id)
    }
}

#[tracing::instrument(skip(state, params))]
pub async fn fail_job_handler(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
    Query(params): Query<FailJobParams>,
) -> Response {
    let reason = params
        .error
        .unwrap_or_else(|| DEFAULT_FAIL_REASON.to_string());
    if state
        .job_queue
        .fail(&JobId::from(job_id.as_str()), reason)
        .await
    {
        Json(StatusResponse { status: "failed" }).into_response()
    } else {
        job_not_found(&job_id)
    }
}

#[tracing::instrument(skip(state))]
pub async fn cancel_job_handler(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Response {
    if state.job_queue.cancel(&JobId::from(job_id.as_str())).await {
        Json(StatusResponse {
            status: "cancelled",
        })
        .into_response()
    } else {
        job_not_found(&job_id)
    }
}

fn job_not_found(job_id: &str) -> Response {
    error_response(StatusCode::NOT_FOUND, format!("Job {} not found", job_id))
}
