pub mod clock;
pub mod embedder;
pub mod observability;

pub use clock::SystemClock;
