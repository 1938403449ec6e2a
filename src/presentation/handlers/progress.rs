use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;
use serde::Deserialize;

use super::jobs::StatusResponse;
use crate::presentation::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ProgressUpdate {
    pub current: i64,
    pub total: i64,
    pub project: String,
}

pub async fn get_progress_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.legacy_progress.report().await)
}

pub async fn update_progress_handler(
    State(state): State<AppState>,
    Json(update): Json<ProgressUpdate>,
) -> impl IntoResponse {
    state
        .legacy_progress
        .update(update.project, update.current, update.total)
        .await;
    Json(StatusResponse { status: "ok" })
}

pub async fn clear_progress_handler(State(state): State<AppState>) -> impl IntoResponse {
    state.legacy_progress.clear().await;
    Json(StatusResponse { status: "ok" })
}
