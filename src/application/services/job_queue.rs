use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::application::ports::Clock;
use crate::application::services::job_projection::{
    self, JobDetail, QueueSnapshot, QueuedJobView, WorkerUsage, round1,
};
use crate::domain::{IndexJob, JobId, JobStatus};

/// Number of terminal jobs kept for the dashboard history.
pub const RECENT_CAPACITY: usize = 10;

/// Where a job currently sits relative to the GPU workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueuePosition {
    Active,
    Waiting(usize),
    Unknown,
}

impl QueuePosition {
    /// 0 for active, 1-based rank for waiting, -1 otherwise.
    pub fn as_wire(&self) -> i64 {
        match self {
            QueuePosition::Active => 0,
            QueuePosition::Waiting(rank) => *rank as i64,
            QueuePosition::Unknown => -1,
        }
    }
}

/// Coordinates indexing jobs submitted by independent client instances.
///
/// Jobs wait in strict FIFO order and are admitted while fewer than
/// `max_workers` are active. Each public mutation is one write-guard
/// critical section with no await inside, so relocation, deletion and the
/// admission sweep that follows are observed atomically. Reads copy owned
/// views out under the read guard.
pub struct JobQueue {
    max_workers: usize,
    clock: Arc<dyn Clock>,
    state: RwLock<QueueState>,
}

#[derive(Default)]
struct QueueState {
    jobs: HashMap<JobId, IndexJob>,
    waiting: VecDeque<JobId>,
    active: Vec<JobId>,
    recent: VecDeque<IndexJob>,
    throughput: Throughput,
}

/// Accumulated work of every completed job that actually ran.
#[derive(Debug, Default, Clone, Copy)]
struct Throughput {
    chunks: i64,
    seconds: f64,
}

impl Throughput {
    fn record(&mut self, chunks: i64, duration: chrono::Duration) {
        self.chunks = self.chunks.saturating_add(chunks);
        self.seconds += duration.num_milliseconds() as f64 / 1000.0;
    }

    fn rate(&self) -> Option<f64> {
        (self.seconds > 0.0).then(|| self.chunks as f64 / self.seconds)
    }

    fn estimate(&self, chunks_ahead: i64) -> Option<f64> {
        self.rate()
            .filter(|rate| *rate > 0.0)
            .map(|rate| chunks_ahead as f64 / rate)
    }
}

impl JobQueue {
    pub fn new(max_workers: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            max_workers: max_workers.max(1),
            clock,
            state: RwLock::new(QueueState::default()),
        }
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Queues a new job and admits it immediately if a worker is free.
    ///
    /// `total_chunks` is taken as declared, including zero or negative values.
    /// The returned position is read under the same guard as the admission,
    /// so it always agrees with the returned job's status.
    pub async fn register(
        &self,
        project: impl Into<String>,
        total_chunks: i64,
        instance_id: impl Into<String>,
    ) -> (IndexJob, QueuePosition) {
        let mut state = self.state.write().await;
        let now = self.clock.now();

        let id = state.fresh_id();
        let job = IndexJob::new(id.clone(), project.into(), instance_id.into(), total_chunks, now);
        tracing::info!(
            job_id = %id,
            project = %job.project,
            instance_id = %job.instance_id,
            total_chunks,
            "Job registered"
        );

        state.jobs.insert(id.clone(), job.clone());
        state.waiting.push_back(id.clone());
        state.admit_waiting(self.max_workers, now);

        let position = state.position(&id);
        (state.jobs.get(&id).cloned().unwrap_or(job), position)
    }

    /// Overwrites progress of an active job. Returns false for unknown or
    /// non-active jobs so stale updates can be ignored by the caller.
    pub async fn update_progress(&self, id: &JobId, current: i64) -> bool {
        let mut state = self.state.write().await;
        match state.jobs.get_mut(id) {
            Some(job) if job.status == JobStatus::Active => {
                job.current = current;
                true
            }
            _ => false,
        }
    }

    pub async fn complete(&self, id: &JobId) -> bool {
        let mut state = self.state.write().await;
        let now = self.clock.now();

        let Some(mut job) = state.take_live(id) else {
            return false;
        };
        job.mark_completed(now);
        if let Some(duration) = job.run_duration() {
            state.throughput.record(job.total_chunks, duration);
        }
        tracing::info!(job_id = %id, project = %job.project, "Job completed");

        state.push_recent(job);
        state.admit_waiting(self.max_workers, now);
        true
    }

    pub async fn fail(&self, id: &JobId, error: impl Into<String>) -> bool {
        let mut state = self.state.write().await;
        let now = self.clock.now();

        let Some(mut job) = state.take_live(id) else {
            return false;
        };
        job.mark_failed(now, error.into());
        tracing::warn!(
            job_id = %id,
            project = %job.project,
            error = job.error.as_deref().unwrap_or_default(),
            "Job failed"
        );

        state.push_recent(job);
        state.admit_waiting(self.max_workers, now);
        true
    }

    /// Drops a waiting or active job without keeping any history.
    pub async fn cancel(&self, id: &JobId) -> bool {
        let mut state = self.state.write().await;
        let now = self.clock.now();

        if state.take_live(id).is_none() {
            return false;
        }
        tracing::info!(job_id = %id, "Job cancelled");

        state.admit_waiting(self.max_workers, now);
        true
    }

    pub async fn clear_recent(&self) -> usize {
        let mut state = self.state.write().await;
        let count = state.recent.len();
        state.recent.clear();
        tracing::info!(count, "Recent jobs cleared");
        count
    }

    pub async fn position(&self, id: &JobId) -> QueuePosition {
        self.state.read().await.position(id)
    }

    /// Seconds until `chunks_ahead` chunks are processed at the historical
    /// rate. `None` until a job that ran for a measurable time completes.
    pub async fn estimate_wait(&self, chunks_ahead: i64) -> Option<f64> {
        self.state.read().await.throughput.estimate(chunks_ahead)
    }

    pub async fn historical_rate(&self) -> Option<f64> {
        self.state.read().await.throughput.rate()
    }

    pub async fn status(&self) -> QueueSnapshot {
        let state = self.state.read().await;
        let now = self.clock.now();

        let active_jobs: Vec<&IndexJob> = state
            .active
            .iter()
            .filter_map(|id| state.jobs.get(id))
            .collect();

        let mut chunks_ahead = active_jobs
            .iter()
            .fold(0i64, |acc, job| acc.saturating_add(job.remaining_chunks()));
        let mut queued = Vec::with_capacity(state.waiting.len());
        for (index, job) in state
            .waiting
            .iter()
            .filter_map(|id| state.jobs.get(id))
            .enumerate()
        {
            queued.push(QueuedJobView {
                job: job_projection::project(job, now),
                position: index + 1,
                chunks_ahead,
                estimated_wait: state.throughput.estimate(chunks_ahead).map(round1),
            });
            chunks_ahead = chunks_ahead.saturating_add(job.remaining_chunks());
        }

        QueueSnapshot {
            active: active_jobs
                .iter()
                .map(|job| job_projection::project(job, now))
                .collect(),
            queued,
            recent: state
                .recent
                .iter()
                .map(|job| job_projection::project(job, now))
                .collect(),
            workers: WorkerUsage {
                max: self.max_workers,
                busy: state.active.len(),
            },
            historical_rate: state.throughput.rate().map(round1),
        }
    }

    /// Live jobs carry their queue position; jobs found only in the recent
    /// history do not.
    pub async fn job_detail(&self, id: &JobId) -> Option<JobDetail> {
        let state = self.state.read().await;
        let now = self.clock.now();

        if let Some(job) = state.jobs.get(id) {
            return Some(JobDetail {
                job: job_projection::project(job, now),
                position: Some(state.position(id).as_wire()),
            });
        }

        state
            .recent
            .iter()
            .find(|job| &job.id == id)
            .map(|job| JobDetail {
                job: job_projection::project(job, now),
                position: None,
            })
    }
}

impl QueueState {
    fn fresh_id(&self) -> JobId {
        loop {
            let id = JobId::generate();
            if !self.jobs.contains_key(&id) {
                return id;
            }
        }
    }

    fn position(&self, id: &JobId) -> QueuePosition {
        if self.active.contains(id) {
            return QueuePosition::Active;
        }
        self.waiting
            .iter()
            .position(|waiting| waiting == id)
            .map(|index| QueuePosition::Waiting(index + 1))
            .unwrap_or(QueuePosition::Unknown)
    }

    /// Removes a job from the live map and from whichever of the waiting
    /// list or active set holds it.
    fn take_live(&mut self, id: &JobId) -> Option<IndexJob> {
        let job = self.jobs.remove(id)?;
        self.waiting.retain(|waiting| waiting != id);
        self.active.retain(|active| active != id);
        Some(job)
    }

    fn push_recent(&mut self, job: IndexJob) {
        self.recent.push_front(job);
        self.recent.truncate(RECENT_CAPACITY);
    }

    fn admit_waiting(&mut self, max_workers: usize, now: DateTime<Utc>) {
        while self.active.len() < max_workers {
            let Some(id) = self.waiting.pop_front() else {
                break;
            };
            let Some(job) = self.jobs.get_mut(&id) else {
                continue;
            };
            if job.status != JobStatus::Queued {
                continue;
            }
            job.activate(now);
            tracing::info!(job_id = %id, project = %job.project, "Job activated");
            self.active.push(id);
        }
    }
}
