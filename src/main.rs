use std::sync::Arc;

use my10_recommend::{
    api::{create_router, AppState},
    config::{CacheBackend, Config},
    db::{self, CacheStore, CacheWriterHandle},
    services::{EngineConfig, RecommendationEngine},
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("my10_recommend=debug,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;

    let pool = db::create_pool(&config.database_url, config.database_max_connections).await?;
    db::run_migrations(&pool).await?;

    let mut cache_writer: Option<CacheWriterHandle> = None;
    let cache_store: Arc<dyn CacheStore> = match config.cache_backend {
        CacheBackend::Postgres => Arc::new(db::PgCacheStore::new(pool.clone())),
        CacheBackend::Redis => {
            let client = db::create_redis_client(&config.redis_url)?;
            let (store, handle) = db::RedisCacheStore::new(client).await;
            cache_writer = Some(handle);
            Arc::new(store)
        }
        CacheBackend::Memory => Arc::new(db::MemoryCacheStore::new()),
    };

    let engine = RecommendationEngine::new(
        Arc::new(db::PgRecommendationStore::new(pool)),
        cache_store,
        EngineConfig {
            candidate_limit: config.candidate_limit,
            ..Default::default()
        },
    );

    let app = create_router(AppState::new(engine));

    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    tracing::info!(
        addr = %config.bind_addr(),
        cache_backend = ?config.cache_backend,
        "Server running"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = cache_writer {
        handle.shutdown().await;
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}
