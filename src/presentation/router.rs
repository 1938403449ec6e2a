use axum::Router;
use axum::middleware;
use axum::routing::{delete, get, post};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::infrastructure::observability::request_id_middleware;
use crate::presentation::handlers::{
    cancel_job_handler, capabilities_handler, clear_progress_handler, clear_recent_handler,
    complete_job_handler, embed_handler, fail_job_handler, get_job_handler, get_progress_handler,
    health_handler, job_progress_handler, list_jobs_handler, register_job_handler, stats_handler,
    update_progress_handler,
};
use crate::presentation::state::AppState;

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    Router::new()
        .route("/health", get(health_handler))
        .route("/stats", get(stats_handler))
        .route("/capabilities", get(capabilities_handler))
        .route("/embed", post(embed_handler))
        .route("/jobs", get(list_jobs_handler).post(register_job_handler))
        .route("/jobs/recent", delete(clear_recent_handler))
        .route(
            "/jobs/{job_id}",
            get(get_job_handler).delete(cancel_job_handler),
        )
        .route("/jobs/{job_id}/progress", post(job_progress_handler))
        .route("/jobs/{job_id}/complete", post(complete_job_handler))
        .route("/jobs/{job_id}/fail", post(fail_job_handler))
        .route(
            "/progress",
            get(get_progress_handler)
                .post(update_progress_handler)
                .delete(clear_progress_handler),
        )
        .layer(middleware::from_fn(request_id_middleware))
        .layer(trace_layer)
        .layer(CompressionLayer::new())
        .layer(cors)
        .with_state(state)
}
