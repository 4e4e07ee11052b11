mod cli;

use crate::cli::{CacheBackendArg, StorageBackendArg, CLI};
use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tinylink_cache::{DisabledCache, MokaUrlCache, RedisUrlCache};
use tinylink_core::{Repository, UrlCache};
use tinylink_gateway::{App, AppState};
use tinylink_redirector::{RedirectorConfig, RedirectorService};
use tinylink_shortener::{ShortenerConfig, ShortenerService};
use tinylink_storage::{InMemoryRepository, MySqlRepository};
use tinylink_telemetry::TelemetryConfig;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CLI::parse();

    let telemetry = TelemetryConfig::builder()
        .service_name("tinylink-gateway")
        .log_format(config.log_format.into())
        .otlp_endpoint(config.otlp_endpoint.clone())
        .build();
    let _guard = tinylink_telemetry::init(&telemetry).context("failed to initialize telemetry")?;

    info!(
        listen_addr = %config.listen_addr,
        base_url = %config.base_url,
        storage_backend = %config.storage,
        cache_backend = %config.cache,
        "starting tinylink gateway"
    );

    let repository = storage(&config).await?;
    let cache = cache(&config).await;
    let cache_ttl = Duration::from_secs(config.cache_ttl_secs);

    let shortener = ShortenerService::new(
        Arc::clone(&repository),
        Arc::clone(&cache),
        ShortenerConfig::builder()
            .base_url(config.base_url.clone())
            .cache_ttl(cache_ttl)
            .max_attempts(config.max_attempts)
            .build(),
    );
    let redirector = RedirectorService::new(
        repository,
        cache,
        RedirectorConfig::builder().cache_ttl(cache_ttl).build(),
    );

    let app = App::router(AppState::new(Arc::new(shortener), Arc::new(redirector)));

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    info!(listen_addr = %listener.local_addr()?, "gateway listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("gateway server failed")?;

    info!("gateway stopped");
    Ok(())
}

async fn storage(config: &CLI) -> anyhow::Result<Arc<dyn Repository>> {
    match config.storage {
        StorageBackendArg::InMemory => Ok(Arc::new(InMemoryRepository::new())),
        StorageBackendArg::Mysql => {
            let mysql_dsn = config
                .mysql_dsn
                .as_deref()
                .context("mysql dsn is required when storage backend is mysql")?;
            let repository = MySqlRepository::connect(mysql_dsn)
                .await
                .context("failed to connect to MySQL")?;
            repository
                .migrate()
                .await
                .context("failed to apply MySQL schema")?;
            Ok(Arc::new(repository))
        }
    }
}

async fn cache(config: &CLI) -> Arc<dyn UrlCache> {
    match config.cache {
        CacheBackendArg::InMemory => Arc::new(MokaUrlCache::with_capacity(config.cache_capacity)),
        CacheBackendArg::None => Arc::new(DisabledCache),
        CacheBackendArg::Redis => match RedisUrlCache::connect(&config.redis_url).await {
            Ok(cache) => Arc::new(cache),
            Err(e) => {
                warn!(error = %e, "Redis unreachable at startup, serving without cache");
                Arc::new(DisabledCache)
            }
        },
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
