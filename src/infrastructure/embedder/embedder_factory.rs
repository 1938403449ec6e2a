use std::sync::Arc;

use crate::application::ports::{Embedder, GpuMemory};
use crate::infrastructure::embedder::{LocalCandleEmbedder, MemoryProfile, MockEmbedder};
use crate::presentation::config::{EmbeddingProvider, EmbeddingsSettings, GpuSettings};

pub struct EmbedderFactory;

#[derive(Debug, thiserror::Error)]
pub enum EmbedderFactoryError {
    #[error("invalid embedder settings: {0}")]
    InvalidSettings(String),
    #[error("model initialization failed: {0}")]
    InitializationFailed(String),
}

impl EmbedderFactory {
    pub fn create(
        embeddings: &EmbeddingsSettings,
        gpu: &GpuSettings,
    ) -> Result<Arc<dyn Embedder>, EmbedderFactoryError> {
        match embeddings.provider {
            EmbeddingProvider::Mock => {
                if embeddings.dimension == 0 {
                    return Err(EmbedderFactoryError::InvalidSettings(
                        "mock embedder dimension must be positive".to_string(),
                    ));
                }
                tracing::info!(dimension = embeddings.dimension, "Using mock embedder");
                Ok(Arc::new(MockEmbedder::new(
                    embeddings.dimension,
                    GpuMemory {
                        total_mb: gpu.total_memory_mb,
                        allocated_mb: 0.0,
                        reserved_mb: 0.0,
                    },
                )))
            }
            EmbeddingProvider::Local => {
                tracing::info!(model = %embeddings.model, "Loading local Candle embedding model");
                let embedder = LocalCandleEmbedder::new(
                    &embeddings.model,
                    embeddings.max_length,
                    MemoryProfile {
                        total_mb: gpu.total_memory_mb,
                        model_mb: gpu.model_memory_mb,
                    },
                )
                .map_err(|e| EmbedderFactoryError::InitializationFailed(e.to_string()))?;
                Ok(Arc::new(embedder))
            }
        }
    }
}
