use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Mutex;

use crate::application::ports::{Embedder, EmbedderError, GpuMemory, ModelInfo};
use crate::application::services::StatsTracker;
use crate::domain::Embedding;

/// Serializes every embedding computation behind one GPU lock.
///
/// Waiters are served in arrival order: `tokio::sync::Mutex` queues them
/// fairly. The compute itself runs on the blocking pool, holding the owned
/// guard, so the GPU is released only when the computation ends even if the
/// awaiting request has gone away.
pub struct EmbeddingService {
    embedder: Arc<dyn Embedder>,
    gpu_lock: Arc<Mutex<()>>,
    stats: Arc<StatsTracker>,
    max_batch_size: usize,
}

impl EmbeddingService {
    pub fn new(embedder: Arc<dyn Embedder>, stats: Arc<StatsTracker>, max_batch_size: usize) -> Self {
        Self {
            embedder,
            gpu_lock: Arc::new(Mutex::new(())),
            stats,
            max_batch_size,
        }
    }

    pub fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }

    pub fn stats(&self) -> &StatsTracker {
        &self.stats
    }

    pub fn model_info(&self) -> ModelInfo {
        self.embedder.model_info()
    }

    pub fn memory(&self) -> GpuMemory {
        self.embedder.memory()
    }

    pub fn gpu_busy(&self) -> bool {
        self.gpu_lock.try_lock().is_err()
    }

    #[tracing::instrument(skip(self, inputs), fields(batch_size = inputs.len()))]
    pub async fn embed(&self, inputs: Vec<String>) -> Result<Vec<Embedding>, EmbedError> {
        let batch_size = inputs.len();
        if batch_size == 0 {
            return Err(EmbedError::EmptyInput);
        }
        if batch_size > self.max_batch_size {
            return Err(EmbedError::BatchTooLarge {
                size: batch_size,
                max: self.max_batch_size,
            });
        }

        let started = Instant::now();
        let (permit, queue_slot) = match Arc::clone(&self.gpu_lock).try_lock_owned() {
            Ok(permit) => (permit, None),
            Err(_) => {
                let slot = self.stats.enter_queue();
                tracing::info!(
                    queue_depth = slot.depth_on_entry(),
                    "Request queued, GPU busy"
                );
                (Arc::clone(&self.gpu_lock).lock_owned().await, Some(slot))
            }
        };
        let was_queued = queue_slot.is_some();

        let embedder = Arc::clone(&self.embedder);
        let computed = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            let result = embedder.embed_batch(&inputs);
            if let Err(EmbedderError::OutOfMemory(_)) = &result {
                embedder.release_cached_memory();
            }
            result
        })
        .await;

        let outcome = match computed {
            Ok(Ok(embeddings)) if embeddings.len() == batch_size => {
                let elapsed = started.elapsed();
                self.stats.record_success(batch_size, elapsed);
                tracing::info!(
                    elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                    was_queued,
                    "Embedded batch"
                );
                Ok(embeddings)
            }
            Ok(Ok(embeddings)) => {
                self.stats.record_error();
                tracing::error!(returned = embeddings.len(), "Embedder returned wrong vector count");
                Err(EmbedError::Compute(format!(
                    "model returned {} vectors for {} inputs",
                    embeddings.len(),
                    batch_size
                )))
            }
            Ok(Err(EmbedderError::OutOfMemory(reason))) => {
                self.stats.record_error();
                tracing::error!(reason = %reason, "GPU out of memory");
                Err(EmbedError::OutOfMemory { batch_size })
            }
            Ok(Err(e)) => {
                self.stats.record_error();
                tracing::error!(error = %e, "Embedding failed");
                Err(EmbedError::Compute(e.to_string()))
            }
            Err(join_error) => {
                self.stats.record_error();
                tracing::error!(error = %join_error, "Embedding task aborted");
                Err(EmbedError::Compute(format!(
                    "embedding task aborted: {}",
                    join_error
                )))
            }
        };

        drop(queue_slot);
        outcome
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EmbedError {
    #[error("inputs cannot be empty")]
    EmptyInput,
    #[error("Batch size {size} exceeds max {max}. Split into smaller batches.")]
    BatchTooLarge { size: usize, max: usize },
    #[error("GPU out of memory. Try a smaller batch size.")]
    OutOfMemory { batch_size: usize },
    #[error("{0}")]
    Compute(String),
}
