use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::application::ports::{Embedder, EmbedderError, GpuMemory, ModelInfo};
use crate::domain::Embedding;

/// Deterministic CPU embedder for development and tests.
///
/// Each text seeds a xorshift stream, so equal texts always map to the same
/// unit vector.
pub struct MockEmbedder {
    dimension: usize,
    memory: GpuMemory,
}

impl MockEmbedder {
    pub fn new(dimension: usize, memory: GpuMemory) -> Self {
        Self { dimension, memory }
    }

    fn vector_for(&self, text: &str) -> Vec<f32> {
        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        let mut state = hasher.finish() | 1;

        (0..self.dimension)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 7;
                state ^= state << 17;
                (state % 2000) as f32 / 1000.0 - 1.0
            })
            .collect()
    }
}

impl Embedder for MockEmbedder {
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>, EmbedderError> {
        Ok(texts
            .iter()
            .map(|text| Embedding::normalized(self.vector_for(text)))
            .collect())
    }

    fn model_info(&self) -> ModelInfo {
        ModelInfo {
            name: "mock".to_string(),
            dimensions: self.dimension,
            dtype: "float32".to_string(),
            device: "cpu".to_string(),
        }
    }

    fn memory(&self) -> GpuMemory {
        self.memory
    }
}
