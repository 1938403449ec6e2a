use config::{Config, ConfigError, File};
use serde::{Deserialize, Serialize};

use super::Environment;
use crate::application::services::BatchSizePolicy;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub embeddings: EmbeddingsSettings,
    pub gpu: GpuSettings,
    pub queue: QueueSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingsSettings {
    pub provider: EmbeddingProvider,
    pub model: String,
    /// Vector size produced by the mock provider.
    pub dimension: usize,
    pub max_batch_size: usize,
    /// Token limit per input text.
    pub max_length: usize,
}

impl Default for EmbeddingsSettings {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::Mock,
            model: "sentence-transformers/all-MiniLM-L6-v2".to_string(),
            dimension: 384,
            max_batch_size: 64,
            max_length: 512,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    Mock,
    Local,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GpuSettings {
    pub total_memory_mb: f64,
    pub model_memory_mb: f64,
    pub safety_margin_mb: f64,
    pub mb_per_batch_item: f64,
    pub min_batch_size: usize,
    pub busy_batch_cap: usize,
}

impl Default for GpuSettings {
    fn default() -> Self {
        Self {
            total_memory_mb: 128_000.0,
            model_memory_mb: 16_000.0,
            safety_margin_mb: 8_000.0,
            mb_per_batch_item: 47.0,
            min_batch_size: 8,
            busy_batch_cap: 32,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueSettings {
    /// Indexing jobs admitted concurrently; one per GPU.
    pub max_workers: usize,
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self { max_workers: 1 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    pub level: String,
    pub enable_json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            enable_json: false,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("invalid setting: {0}")]
    Invalid(String),
}

impl Settings {
    /// Layers built-in defaults, `appsettings.{environment}.toml` if present,
    /// and `APP_SECTION__KEY` environment variables.
    pub fn load(environment: Environment) -> Result<Self, SettingsError> {
        let settings: Settings = Config::builder()
            .add_source(Config::try_from(&Settings::default())?)
            .add_source(File::with_name(&environment.settings_file()).required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.embeddings.max_batch_size == 0 {
            return Err(SettingsError::Invalid(
                "embeddings.max_batch_size must be positive".to_string(),
            ));
        }
        if self.queue.max_workers == 0 {
            return Err(SettingsError::Invalid(
                "queue.max_workers must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn batch_size_policy(&self) -> BatchSizePolicy {
        BatchSizePolicy {
            max_batch_size: self.embeddings.max_batch_size,
            min_batch_size: self.gpu.min_batch_size,
            safety_margin_mb: self.gpu.safety_margin_mb,
            mb_per_item: self.gpu.mb_per_batch_item,
            busy_batch_cap: self.gpu.busy_batch_cap,
        }
    }
}
