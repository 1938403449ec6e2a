use chrono::{DateTime, Utc};

/// Single global progress slot from before multi-instance job tracking.
#[derive(Debug, Clone, PartialEq)]
pub struct LegacyProgress {
    pub project: String,
    pub current: i64,
    pub total: i64,
    pub started_at: DateTime<Utc>,
}
