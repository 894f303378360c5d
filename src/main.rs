use std::sync::Arc;

use axum::http::HeaderName;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use moviify_api::{
    api::{create_router, AppState},
    config::Config,
    db::{create_redis_client, CacheStore, InMemoryCacheStore, RedisCacheStore},
    services::{MetadataProvider, TmdbClient, TmdbProxyService, WatchProviderService},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("moviify_api=info,tower_http=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let tmdb = TmdbClient::from_config(&config)?;
    if !tmdb.is_configured() {
        tracing::error!(
            "TMDB_API_KEY is not configured; every watch-provider and TMDB proxy request will fail"
        );
    }
    let metadata: Arc<dyn MetadataProvider> = Arc::new(tmdb);

    let cache = create_cache_store(&config).await?;

    let watch_providers =
        WatchProviderService::new(metadata.clone(), cache.clone()).with_ttl(config.cache_ttl()?);
    let tmdb_proxy = TmdbProxyService::new(metadata, cache).with_ttl(config.proxy_cache_ttl()?);

    let region_header = HeaderName::try_from(config.region_header.as_str())
        .map_err(|e| anyhow::anyhow!("Invalid REGION_HEADER: {}", e))?;
    let state = AppState::new(Arc::new(watch_providers), Arc::new(tmdb_proxy))
        .with_region_header(region_header);

    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server running");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Redis when configured and reachable, process memory otherwise
async fn create_cache_store(config: &Config) -> anyhow::Result<Arc<dyn CacheStore>> {
    let Some(redis_url) = &config.redis_url else {
        tracing::warn!("REDIS_URL not set, caching in memory");
        return Ok(Arc::new(InMemoryCacheStore::new()));
    };

    let client = create_redis_client(redis_url)?;
    match RedisCacheStore::new(client).await {
        Ok(store) => {
            tracing::info!("Caching in Redis");
            Ok(Arc::new(store))
        }
        Err(e) => {
            tracing::error!(error = %e, "Redis unreachable at startup, caching in memory");
            Ok(Arc::new(InMemoryCacheStore::new()))
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
