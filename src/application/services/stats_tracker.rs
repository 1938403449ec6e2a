use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use serde::Serialize;

use super::job_projection::round1;

/// Raw embed counters. Averages and rates are derived on read.
#[derive(Debug)]
pub struct StatsTracker {
    started_at: Instant,
    requests: AtomicU64,
    texts_embedded: AtomicU64,
    total_latency_us: AtomicU64,
    errors: AtomicU64,
    queue_waits: AtomicU64,
    queue_depth: AtomicU64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSnapshot {
    pub requests: u64,
    pub texts_embedded: u64,
    pub errors: u64,
    pub queue_waits: u64,
    pub queue_depth: u64,
    pub avg_latency_ms: f64,
    pub uptime_seconds: f64,
    pub texts_per_second: f64,
}

/// Counts one request waiting for the GPU until dropped.
#[must_use]
pub struct QueueSlot<'a> {
    depth: &'a AtomicU64,
    depth_on_entry: u64,
}

impl QueueSlot<'_> {
    pub fn depth_on_entry(&self) -> u64 {
        self.depth_on_entry
    }
}

impl Drop for QueueSlot<'_> {
    fn drop(&mut self) {
        self.depth.fetch_sub(1, Ordering::Relaxed);
    }
}

impl StatsTracker {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            requests: AtomicU64::new(0),
            texts_embedded: AtomicU64::new(0),
            total_latency_us: AtomicU64::new(0),
            errors: AtomicU64::new(0),
            queue_waits: AtomicU64::new(0),
            queue_depth: AtomicU64::new(0),
        }
    }

    pub fn record_success(&self, texts: usize, latency: Duration) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        self.texts_embedded.fetch_add(texts as u64, Ordering::Relaxed);
        self.total_latency_us
            .fetch_add(latency.as_micros() as u64, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a queue-wait event and holds one unit of queue depth for the
    /// lifetime of the returned slot.
    pub fn enter_queue(&self) -> QueueSlot<'_> {
        self.queue_waits.fetch_add(1, Ordering::Relaxed);
        let depth_on_entry = self.queue_depth.fetch_add(1, Ordering::Relaxed) + 1;
        QueueSlot {
            depth: &self.queue_depth,
            depth_on_entry,
        }
    }

    pub fn queue_depth(&self) -> u64 {
        self.queue_depth.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let requests = self.requests.load(Ordering::Relaxed);
        let texts_embedded = self.texts_embedded.load(Ordering::Relaxed);
        let total_latency_ms = self.total_latency_us.load(Ordering::Relaxed) as f64 / 1000.0;
        let uptime = self.started_at.elapsed().as_secs_f64();

        StatsSnapshot {
            requests,
            texts_embedded,
            errors: self.errors.load(Ordering::Relaxed),
            queue_waits: self.queue_waits.load(Ordering::Relaxed),
            queue_depth: self.queue_depth.load(Ordering::Relaxed),
            avg_latency_ms: round1(total_latency_ms / requests.max(1) as f64),
            uptime_seconds: round1(uptime),
            texts_per_second: (texts_embedded as f64 / uptime.max(1.0) * 100.0).round() / 100.0,
        }
    }
}

impl Default for StatsTracker {
    fn default() -> Self {
        Self::new()
    }
}
