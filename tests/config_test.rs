use candle_core::DType;
use spark_embed::application::ports::{Embedder, GpuMemory};
use spark_embed::application::services::BatchSizePolicy;
use spark_embed::domain::{Embedding, JobId, JobStatus};
use spark_embed::infrastructure::embedder::{
    EmbedderFactory, EmbedderFactoryError, MockEmbedder, dtype_label,
};
use spark_embed::infrastructure::observability::TracingConfig;
use spark_embed::presentation::config::{EmbeddingProvider, LoggingSettings};
use spark_embed::presentation::{Environment, Settings};

#[test]
fn given_default_settings_when_validating_then_ok_and_policy_matches_defaults() {
    let settings = Settings::default();

    assert!(settings.validate().is_ok());
    assert_eq!(settings.server.port, 8080);
    assert_eq!(settings.queue.max_workers, 1);
    assert_eq!(settings.embeddings.provider, EmbeddingProvider::Mock);
    assert_eq!(settings.batch_size_policy(), BatchSizePolicy::default());
}

#[test]
fn given_zero_batch_size_when_validating_then_error() {
    let mut settings = Settings::default();
    settings.embeddings.max_batch_size = 0;

    let err = settings.validate().unwrap_err();

    assert!(err.to_string().contains("max_batch_size"));
}

#[test]
fn given_zero_workers_when_validating_then_error() {
    let mut settings = Settings::default();
    settings.queue.max_workers = 0;

    assert!(settings.validate().is_err());
}

#[test]
fn given_environment_names_when_parsing_then_known_values_map() {
    assert_eq!(Environment::try_from("LOCAL".to_string()), Ok(Environment::Local));
    assert_eq!(Environment::try_from("production".to_string()), Ok(Environment::Prod));
    assert!(Environment::try_from("staging".to_string()).is_err());
    assert_eq!(Environment::Test.settings_file(), "appsettings.test");
}

#[test]
fn given_logging_settings_when_building_tracing_config_then_directive_uses_level() {
    let logging = LoggingSettings {
        level: "warn".to_string(),
        enable_json: true,
    };

    let config = TracingConfig::from_settings(&logging, Environment::Prod);

    assert!(config.json_format);
    assert_eq!(config.environment, "prod");
    assert_eq!(config.default_directive(), "warn,spark_embed=debug,tower_http=debug");
}

#[test]
fn given_mock_provider_when_creating_embedder_then_dimension_and_memory_follow_settings() {
    let settings = Settings::default();

    let embedder = EmbedderFactory::create(&settings.embeddings, &settings.gpu).unwrap();

    let info = embedder.model_info();
    assert_eq!(info.name, "mock");
    assert_eq!(info.dimensions, 384);
    assert_eq!(embedder.memory().total_mb, 128_000.0);
    assert_eq!(embedder.memory().reserved_mb, 0.0);
}

#[test]
fn given_zero_dimension_when_creating_mock_embedder_then_invalid_settings() {
    let mut settings = Settings::default();
    settings.embeddings.dimension = 0;

    let result = EmbedderFactory::create(&settings.embeddings, &settings.gpu);

    assert!(matches!(result, Err(EmbedderFactoryError::InvalidSettings(_))));
}

#[test]
fn given_same_text_when_mock_embedding_then_vectors_are_equal_and_unit_length() {
    let embedder = MockEmbedder::new(
        16,
        GpuMemory {
            total_mb: 1000.0,
            allocated_mb: 0.0,
            reserved_mb: 0.0,
        },
    );
    let texts = vec!["fn main() {}".to_string(), "fn main() {}".to_string(), "other".to_string()];

    let vectors = embedder.embed_batch(&texts).unwrap();

    assert_eq!(vectors.len(), 3);
    assert_eq!(vectors[0], vectors[1]);
    assert_ne!(vectors[0], vectors[2]);
    assert!((vectors[0].norm() - 1.0).abs() < 1e-5);
    assert_eq!(vectors[0].dimensions(), 16);
}

#[test]
fn given_vector_when_normalizing_then_length_is_one_and_zero_vector_is_kept() {
    let unit = Embedding::normalized(vec![3.0, 4.0]);
    let zero = Embedding::normalized(vec![0.0, 0.0]);

    assert_eq!(unit.values, vec![0.6, 0.8]);
    assert_eq!(zero.values, vec![0.0, 0.0]);
    assert_eq!(serde_json::to_string(&unit).unwrap(), "[0.6,0.8]");
}

#[test]
fn given_generated_job_ids_when_comparing_then_short_hex_and_distinct() {
    let first = JobId::generate();
    let second = JobId::generate();

    assert_eq!(first.as_str().len(), 8);
    assert!(first.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    assert_ne!(first, second);
}

#[test]
fn given_job_statuses_when_serializing_then_lowercase_names_are_used() {
    assert_eq!(serde_json::to_string(&JobStatus::Queued).unwrap(), "\"queued\"");
    assert_eq!(JobStatus::Completed.to_string(), "completed");
    assert_eq!(JobStatus::Failed.as_str(), "failed");
}

#[test]
fn given_tensor_dtypes_when_labelling_then_wire_names_match_mock() {
    assert_eq!(dtype_label(DType::F16), "float16");
    assert_eq!(dtype_label(DType::F32), "float32");
    assert_eq!(dtype_label(DType::BF16), "bfloat16");
}

#[test]
fn given_driver_reading_when_converting_then_used_memory_is_reserved() {
    let gib = 1024 * 1024 * 1024;

    let memory = GpuMemory::from_device_info(6 * gib, 8 * gib);

    assert_eq!(memory.total_mb, 8192.0);
    assert_eq!(memory.reserved_mb, 2048.0);
    assert_eq!(memory.allocated_mb, 2048.0);
}

#[test]
fn given_free_above_total_when_converting_then_used_is_zero() {
    let memory = GpuMemory::from_device_info(10, 5);

    assert_eq!(memory.reserved_mb, 0.0);
}
