use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;
use serde::Serialize;

use crate::application::services::job_projection::round1;
use crate::presentation::state::AppState;

#[derive(Serialize)]
pub struct CapabilitiesResponse {
    pub version: &'static str,
    pub gpu_total_mb: f64,
    pub gpu_allocated_mb: f64,
    pub gpu_reserved_mb: f64,
    pub gpu_available_mb: f64,
    pub model_memory_mb: f64,
    pub max_batch_size: usize,
    pub recommended_batch_size: usize,
    pub gpu_busy: bool,
}

/// Batch sizing hints for clients; tighter while the GPU is busy.
pub async fn capabilities_handler(State(state): State<AppState>) -> impl IntoResponse {
    let service = &state.embedding_service;
    let memory = service.memory();
    let gpu_busy = service.gpu_busy();

    Json(CapabilitiesResponse {
        version: env!("CARGO_PKG_VERSION"),
        gpu_total_mb: round1(memory.total_mb),
        gpu_allocated_mb: round1(memory.allocated_mb),
        gpu_reserved_mb: round1(memory.reserved_mb),
        gpu_available_mb: round1(state.batch_policy.available_mb(&memory).max(0.0)),
        model_memory_mb: round1(state.model_memory_mb),
        max_batch_size: service.max_batch_size(),
        recommended_batch_size: state
            .batch_policy
            .recommended_under_load(&memory, gpu_busy),
        gpu_busy,
    })
}
