use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{IndexJob, JobId, JobStatus};

/// Wire view of a job with its derived metrics computed at `now`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobView {
    pub id: JobId,
    pub project: String,
    pub total_chunks: i64,
    pub instance_id: String,
    pub current: i64,
    pub status: JobStatus,
    pub created_at: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_seconds: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunks_per_second: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eta_seconds: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percent: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueuedJobView {
    #[serde(flatten)]
    pub job: JobView,
    pub position: usize,
    pub chunks_ahead: i64,
    pub estimated_wait: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobDetail {
    #[serde(flatten)]
    pub job: JobView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WorkerUsage {
    pub max: usize,
    pub busy: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueueSnapshot {
    pub active: Vec<JobView>,
    pub queued: Vec<QueuedJobView>,
    pub recent: Vec<JobView>,
    pub workers: WorkerUsage,
    pub historical_rate: Option<f64>,
}

/// Projects a stored job into its wire view. Pure: the only input besides
/// the job is the caller-supplied `now`.
pub fn project(job: &IndexJob, now: DateTime<Utc>) -> JobView {
    let elapsed = match (job.status, job.started_at) {
        (JobStatus::Active, Some(started)) => Some(seconds_between(started, now)),
        _ => None,
    };
    let rate = elapsed
        .filter(|secs| *secs > 0.0)
        .map(|secs| job.current as f64 / secs);
    let eta = rate
        .filter(|r| *r > 0.0)
        .map(|r| job.remaining_chunks() as f64 / r);
    let percent = (job.total_chunks > 0).then(|| percent_of(job.current, job.total_chunks));

    JobView {
        id: job.id.clone(),
        project: job.project.clone(),
        total_chunks: job.total_chunks,
        instance_id: job.instance_id.clone(),
        current: job.current,
        status: job.status,
        created_at: unix_seconds(job.created_at),
        started_at: job.started_at.map(unix_seconds),
        elapsed_seconds: elapsed.map(round1),
        chunks_per_second: rate.map(round1),
        eta_seconds: eta.map(round1),
        percent,
        completed_at: job.completed_at.map(unix_seconds),
        duration_seconds: job
            .run_duration()
            .map(|d| round1(d.num_milliseconds() as f64 / 1000.0)),
        error: job.error.clone(),
    }
}

/// Floor of `current * 100 / total` for a positive `total`, computed wide so
/// client-supplied counters cannot overflow.
pub fn percent_of(current: i64, total: i64) -> i64 {
    let percent = (i128::from(current) * 100).div_euclid(i128::from(total));
    percent.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64
}

pub fn unix_seconds(at: DateTime<Utc>) -> f64 {
    at.timestamp_millis() as f64 / 1000.0
}

pub fn seconds_between(earlier: DateTime<Utc>, later: DateTime<Utc>) -> f64 {
    (later - earlier).num_milliseconds() as f64 / 1000.0
}

pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
