#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};

use spark_embed::application::ports::{Clock, Embedder, EmbedderError, GpuMemory, ModelInfo};
use spark_embed::domain::Embedding;

pub const TEST_DIMENSION: usize = 8;

/// Clock that only moves when told to.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            now: Mutex::new(Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap()),
        })
    }

    pub fn advance_secs(&self, secs: i64) {
        let mut now = self.now.lock().unwrap();
        *now += chrono::Duration::seconds(secs);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

pub fn test_memory() -> GpuMemory {
    GpuMemory {
        total_mb: 128_000.0,
        allocated_mb: 16_000.0,
        reserved_mb: 16_000.0,
    }
}

fn test_model_info() -> ModelInfo {
    ModelInfo {
        name: "test-model".to_string(),
        dimensions: TEST_DIMENSION,
        dtype: "float32".to_string(),
        device: "cpu".to_string(),
    }
}

/// Embedder that sleeps inside compute and records how many computations
/// overlap.
pub struct InstrumentedEmbedder {
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    pub calls: AtomicUsize,
    pub compute_time: Duration,
}

impl InstrumentedEmbedder {
    pub fn new(compute_time: Duration) -> Arc<Self> {
        Arc::new(Self {
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
            compute_time,
        })
    }
}

impl Embedder for InstrumentedEmbedder {
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>, EmbedderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);
        std::thread::sleep(self.compute_time);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        Ok(texts
            .iter()
            .enumerate()
            .map(|(i, _)| Embedding::new(vec![i as f32; TEST_DIMENSION]))
            .collect())
    }

    fn model_info(&self) -> ModelInfo {
        test_model_info()
    }

    fn memory(&self) -> GpuMemory {
        test_memory()
    }
}

/// Embedder whose every call fails with the configured error kind.
pub struct FailingEmbedder {
    pub out_of_memory: bool,
    pub releases: AtomicUsize,
}

impl FailingEmbedder {
    pub fn out_of_memory() -> Arc<Self> {
        Arc::new(Self {
            out_of_memory: true,
            releases: AtomicUsize::new(0),
        })
    }

    pub fn broken() -> Arc<Self> {
        Arc::new(Self {
            out_of_memory: false,
            releases: AtomicUsize::new(0),
        })
    }
}

impl Embedder for FailingEmbedder {
    fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Embedding>, EmbedderError> {
        if self.out_of_memory {
            Err(EmbedderError::OutOfMemory(
                "CUDA_ERROR_OUT_OF_MEMORY".to_string(),
            ))
        } else {
            Err(EmbedderError::InferenceFailed("kernel launch failed".to_string()))
        }
    }

    fn model_info(&self) -> ModelInfo {
        test_model_info()
    }

    fn memory(&self) -> GpuMemory {
        test_memory()
    }

    fn release_cached_memory(&self) {
        self.releases.fetch_add(1, Ordering::SeqCst);
    }
}
