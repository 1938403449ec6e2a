use crate::application::ports::GpuMemory;

/// Derives a client batch size from free device memory.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchSizePolicy {
    pub max_batch_size: usize,
    pub min_batch_size: usize,
    pub safety_margin_mb: f64,
    pub mb_per_item: f64,
    pub busy_batch_cap: usize,
}

impl Default for BatchSizePolicy {
    fn default() -> Self {
        Self {
            max_batch_size: 64,
            min_batch_size: 8,
            safety_margin_mb: 8000.0,
            mb_per_item: 47.0,
            busy_batch_cap: 32,
        }
    }
}

impl BatchSizePolicy {
    pub fn available_mb(&self, memory: &GpuMemory) -> f64 {
        memory.total_mb - memory.reserved_mb - self.safety_margin_mb
    }

    pub fn recommended(&self, memory: &GpuMemory) -> usize {
        let available = self.available_mb(memory);
        if available <= 0.0 || self.mb_per_item <= 0.0 {
            return self.min_batch_size;
        }
        let fits = (available / self.mb_per_item) as usize;
        fits.min(self.max_batch_size).max(self.min_batch_size)
    }

    /// Like [`recommended`](Self::recommended), but more conservative while
    /// another request holds the GPU.
    pub fn recommended_under_load(&self, memory: &GpuMemory, gpu_busy: bool) -> usize {
        let recommended = self.recommended(memory);
        if gpu_busy {
            recommended.min(self.busy_batch_cap)
        } else {
            recommended
        }
    }
}
