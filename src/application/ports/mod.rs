mod clock;
mod embedder;

pub use clock::Clock;
pub use embedder::{Embedder, EmbedderError, GpuMemory, ModelInfo};
