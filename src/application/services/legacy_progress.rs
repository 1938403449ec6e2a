use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;

use crate::application::ports::Clock;
use crate::application::services::job_projection::{percent_of, round1, seconds_between};
use crate::domain::LegacyProgress;

/// Single-slot progress surface kept for clients that predate job
/// registration. Independent of the job queue.
pub struct LegacyProgressTracker {
    clock: Arc<dyn Clock>,
    slot: Mutex<Option<LegacyProgress>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegacyProgressReport {
    pub active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percent: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_seconds: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eta_seconds: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunks_per_second: Option<f64>,
}

impl LegacyProgressReport {
    fn idle() -> Self {
        Self {
            active: false,
            project: None,
            current: None,
            total: None,
            percent: None,
            elapsed_seconds: None,
            eta_seconds: None,
            chunks_per_second: None,
        }
    }
}

impl LegacyProgressTracker {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            slot: Mutex::new(None),
        }
    }

    /// Overwrites the slot; the start time is kept from the first update.
    pub async fn update(&self, project: String, current: i64, total: i64) {
        let mut slot = self.slot.lock().await;
        let started_at = slot
            .as_ref()
            .map(|progress| progress.started_at)
            .unwrap_or_else(|| self.clock.now());
        *slot = Some(LegacyProgress {
            project,
            current,
            total,
            started_at,
        });
    }

    pub async fn clear(&self) {
        *self.slot.lock().await = None;
    }

    pub async fn report(&self) -> LegacyProgressReport {
        let slot = self.slot.lock().await;
        let Some(progress) = slot.as_ref() else {
            return LegacyProgressReport::idle();
        };

        let elapsed = seconds_between(progress.started_at, self.clock.now()).max(0.0);
        let rate = if elapsed > 0.0 {
            progress.current as f64 / elapsed
        } else {
            0.0
        };
        let percent = if progress.total > 0 {
            percent_of(progress.current, progress.total)
        } else {
            0
        };
        let eta = (progress.current > 0 && progress.total > 0 && rate > 0.0)
            .then(|| (progress.total as f64 - progress.current as f64) / rate)
            .filter(|eta| *eta != 0.0);

        LegacyProgressReport {
            active: true,
            project: Some(progress.project.clone()),
            current: Some(progress.current),
            total: Some(progress.total),
            percent: Some(percent),
            elapsed_seconds: Some(round1(elapsed)),
            eta_seconds: eta.map(round1),
            chunks_per_second: Some(round1(rate)),
        }
    }
}
