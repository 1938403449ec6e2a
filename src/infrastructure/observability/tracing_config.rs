use crate::presentation::config::{Environment, LoggingSettings};

/// Configuration for tracing initialization.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    pub environment: String,
    pub json_format: bool,
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,
}

impl TracingConfig {
    pub fn from_settings(settings: &LoggingSettings, environment: Environment) -> Self {
        Self {
            environment: environment.to_string(),
            json_format: settings.enable_json,
            level: settings.level.clone(),
        }
    }

    pub fn default_directive(&self) -> String {
        format!("{},spark_embed=debug,tower_http=debug", self.level)
    }
}
