use serde::Serialize;

use crate::domain::Embedding;

/// Blocking embedding capability of the GPU-resident model.
///
/// Implementations run on a blocking thread and must never be called
/// concurrently; the embedding service owns that guarantee.
pub trait Embedder: Send + Sync {
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>, EmbedderError>;

    fn model_info(&self) -> ModelInfo;

    fn memory(&self) -> GpuMemory;

    /// Returns cached device memory to the allocator after an OOM.
    fn release_cached_memory(&self) {}
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub name: String,
    pub dimensions: usize,
    pub dtype: String,
    pub device: String,
}

/// Device memory figures in megabytes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GpuMemory {
    pub total_mb: f64,
    pub allocated_mb: f64,
    pub reserved_mb: f64,
}

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

impl GpuMemory {
    /// Converts a driver free/total reading. Everything not free counts as
    /// both allocated and reserved.
    pub fn from_device_info(free_bytes: usize, total_bytes: usize) -> Self {
        let used_mb = total_bytes.saturating_sub(free_bytes) as f64 / BYTES_PER_MB;
        Self {
            total_mb: total_bytes as f64 / BYTES_PER_MB,
            allocated_mb: used_mb,
            reserved_mb: used_mb,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EmbedderError {
    #[error("device out of memory: {0}")]
    OutOfMemory(String),
    #[error("model loading failed: {0}")]
    ModelLoadFailed(String),
    #[error("inference failed: {0}")]
    InferenceFailed(String),
}
