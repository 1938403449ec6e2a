mod batch_sizing;
mod embedding_service;
pub mod job_projection;
mod job_queue;
mod legacy_progress;
mod stats_tracker;

pub use batch_sizing::BatchSizePolicy;
pub use embedding_service::{EmbedError, EmbeddingService};
pub use job_projection::{JobDetail, JobView, QueueSnapshot, QueuedJobView, WorkerUsage};
pub use job_queue::{JobQueue, QueuePosition, RECENT_CAPACITY};
pub use legacy_progress::{LegacyProgressReport, LegacyProgressTracker};
pub use stats_tracker::{QueueSlot, StatsSnapshot, StatsTracker};
