mod environment;
mod settings;

pub use environment::Environment;
pub use settings::{
    EmbeddingProvider, EmbeddingsSettings, GpuSettings, LoggingSettings, QueueSettings,
    ServerSettings, Settings, SettingsError,
};
