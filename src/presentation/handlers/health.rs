use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Serialize;

use crate::application::services::job_projection::round1;
use crate::presentation::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub model: String,
    pub dimensions: usize,
    pub dtype: String,
    pub device: String,
    pub max_batch_size: usize,
    pub gpu_memory_allocated_mb: f64,
    pub gpu_memory_reserved_mb: f64,
}

pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let service = &state.embedding_service;
    let model = service.model_info();
    let memory = service.memory();

    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok",
            version: env!("CARGO_PKG_VERSION"),
            model: model.name,
            dimensions: model.dimensions,
            dtype: model.dtype,
            device: model.device,
            max_batch_size: service.max_batch_size(),
            gpu_memory_allocated_mb: round1(memory.allocated_mb),
            gpu_memory_reserved_mb: round1(memory.reserved_mb),
        }),
    )
}
