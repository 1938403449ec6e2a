mod embedder_factory;
mod local_candle_embedder;
mod mock_embedder;

pub use embedder_factory::{EmbedderFactory, EmbedderFactoryError};
pub use local_candle_embedder::{LocalCandleEmbedder, MemoryProfile, dtype_label};
pub use mock_embedder::MockEmbedder;
