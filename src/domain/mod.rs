mod embedding;
mod job;
mod job_id;
mod job_status;
mod legacy_progress;

pub use embedding::Embedding;
pub use job::IndexJob;
pub use job_id::JobId;
pub use job_status::JobStatus;
pub use legacy_progress::LegacyProgress;
