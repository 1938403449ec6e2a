use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use super::error::error_response;
use crate::application::services::EmbedError;
use crate::presentation::state::AppState;

#[derive(Debug, Deserialize)]
pub struct EmbedRequest {
    pub inputs: Vec<String>,
}

pub async fn embed_handler(
    State(state): State<AppState>,
    Json(request): Json<EmbedRequest>,
) -> Response {
    match state.embedding_service.embed(request.inputs).await {
        Ok(embeddings) => Json(embeddings).into_response(),
        Err(e) => {
            let status = match &e {
                EmbedError::EmptyInput | EmbedError::BatchTooLarge { .. } => {
                    StatusCode::BAD_REQUEST
                }
                EmbedError::OutOfMemory { .. } => StatusCode::SERVICE_UNAVAILABLE,
                EmbedError::Compute(_) => StatusCode::INTERNAL_SERVER_ERROR,
            };
            error_response(status, e.to_string())
        }
    }
}
