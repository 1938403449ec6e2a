use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;
use serde::Serialize;

use crate::application::services::StatsSnapshot;
use crate::application::services::job_projection::round1;
use crate::presentation::state::AppState;

#[derive(Serialize)]
pub struct StatsResponse {
    pub version: &'static str,
    #[serde(flatten)]
    pub stats: StatsSnapshot,
    pub gpu_busy: bool,
    pub gpu_memory_allocated_mb: f64,
    pub gpu_memory_reserved_mb: f64,
}

pub async fn stats_handler(State(state): State<AppState>) -> impl IntoResponse {
    let service = &state.embedding_service;
    let memory = service.memory();

    Json(StatsResponse {
        version: env!("CARGO_PKG_VERSION"),
        stats: service.stats().snapshot(),
        gpu_busy: service.gpu_busy(),
        gpu_memory_allocated_mb: round1(memory.allocated_mb),
        gpu_memory_reserved_mb: round1(memory.reserved_mb),
    })
}
