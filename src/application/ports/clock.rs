use chrono::{DateTime, Utc};

/// Source of wall-clock time for job timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}
