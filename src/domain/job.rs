use chrono::{DateTime, Utc};

use super::{JobId, JobStatus};

/// One client-declared indexing run.
///
/// Only identity, counters and timestamps are stored here. Percentages,
/// rates and ETAs are derived at read time by the job projection.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexJob {
    pub id: JobId,
    pub project: String,
    pub instance_id: String,
    pub total_chunks: i64,
    pub current: i64,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl IndexJob {
    pub fn new(
        id: JobId,
        project: String,
        instance_id: String,
        total_chunks: i64,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            project,
            instance_id,
            total_chunks,
            current: 0,
            status: JobStatus::Queued,
            created_at,
            started_at: None,
            completed_at: None,
            error: None,
        }
    }

    pub(crate) fn activate(&mut self, now: DateTime<Utc>) {
        self.status = JobStatus::Active;
        self.started_at = Some(now);
    }

    pub(crate) fn mark_completed(&mut self, now: DateTime<Utc>) {
        self.status = JobStatus::Completed;
        self.completed_at = Some(now);
        self.current = self.total_chunks;
    }

    pub(crate) fn mark_failed(&mut self, now: DateTime<Utc>, error: String) {
        self.status = JobStatus::Failed;
        self.completed_at = Some(now);
        self.error = Some(error);
    }

    /// Remaining chunks, floored at zero so over-reported progress never
    /// shrinks another job's backlog.
    pub fn remaining_chunks(&self) -> i64 {
        self.total_chunks.saturating_sub(self.current).max(0)
    }

    /// Wall time between activation and termination, if the job ran.
    pub fn run_duration(&self) -> Option<chrono::Duration> {
        match (self.started_at, self.completed_at) {
            (Some(started), Some(completed)) => Some(completed - started),
            _ => None,
        }
    }
}
