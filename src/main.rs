use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;

use spark_embed::application::ports::Clock;
use spark_embed::application::services::{
    EmbeddingService, JobQueue, LegacyProgressTracker, StatsTracker,
};
use spark_embed::infrastructure::SystemClock;
use spark_embed::infrastructure::embedder::EmbedderFactory;
use spark_embed::infrastructure::observability::{TracingConfig, init_tracing};
use spark_embed::presentation::{AppState, Environment, Settings, create_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let environment = Environment::from_env().map_err(anyhow::Error::msg)?;
    let settings = Settings::load(environment)?;

    init_tracing(
        &TracingConfig::from_settings(&settings.logging, environment),
        settings.server.port,
    );

    let embedder = EmbedderFactory::create(&settings.embeddings, &settings.gpu)?;
    let model = embedder.model_info();
    tracing::info!(
        model = %model.name,
        dimensions = model.dimensions,
        device = %model.device,
        "Embedding model ready"
    );

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let stats = Arc::new(StatsTracker::new());
    let state = AppState {
        job_queue: Arc::new(JobQueue::new(settings.queue.max_workers, Arc::clone(&clock))),
        embedding_service: Arc::new(EmbeddingService::new(
            embedder,
            stats,
            settings.embeddings.max_batch_size,
        )),
        legacy_progress: Arc::new(LegacyProgressTracker::new(clock)),
        batch_policy: settings.batch_size_policy(),
        model_memory_mb: settings.gpu.model_memory_mb,
    };

    let router = create_router(state);

    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, max_workers = settings.queue.max_workers, "Listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
