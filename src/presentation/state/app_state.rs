use std::sync::Arc;

use crate::application::services::{
    BatchSizePolicy, EmbeddingService, JobQueue, LegacyProgressTracker,
};

/// Shared handles for request handlers. Every component is constructed once
/// in `main` and passed in here; nothing lives in statics.
#[derive(Clone)]
pub struct AppState {
    pub job_queue: Arc<JobQueue>,
    pub embedding_service: Arc<EmbeddingService>,
    pub legacy_progress: Arc<LegacyProgressTracker>,
    pub batch_policy: BatchSizePolicy,
    /// Configured footprint of the resident model, reported to clients.
    pub model_memory_mb: f64,
}
