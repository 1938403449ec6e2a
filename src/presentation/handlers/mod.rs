mod capabilities;
mod embed;
mod error;
mod health;
mod jobs;
mod progress;
mod stats;

pub use capabilities::capabilities_handler;
pub use embed::embed_handler;
pub use error::ErrorResponse;
pub use health::health_handler;
pub use jobs::{
    cancel_job_handler, clear_recent_handler, complete_job_handler, fail_job_handler,
    get_job_handler, job_progress_handler, list_jobs_handler, register_job_handler,
};
pub use progress::{clear_progress_handler, get_progress_handler, update_progress_handler};
pub use stats::stats_handler;
