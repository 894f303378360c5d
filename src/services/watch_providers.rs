use std::sync::Arc;

use crate::{
    db::{Cache, CacheEntry, CacheKey, CacheStore},
    error::{AppError, AppResult},
    models::{MediaType, WatchProviderResolution},
    services::{
        clock::{Clock, SystemClock},
        normalizer::normalize,
        providers::MetadataProvider,
        region::{preferred_regions, resolve_region},
    },
};

/// Default freshness window for resolved lookups
pub fn default_cache_ttl() -> chrono::Duration {
    chrono::Duration::hours(24)
}

/// One watch-provider lookup
#[derive(Debug, Clone)]
pub struct WatchProviderRequest {
    pub title_id: String,
    pub media_type: MediaType,
    /// Explicit region chosen by the caller
    pub region_override: Option<String>,
    /// Region derived from the request, e.g. a geo-IP header
    pub region_hint: Option<String>,
}

/// Resolves where a title can be watched, caching each answer for `ttl`
pub struct WatchProviderService {
    upstream: Arc<dyn MetadataProvider>,
    cache: Cache,
    clock: Arc<dyn Clock>,
    ttl: chrono::Duration,
}

impl WatchProviderService {
    pub fn new(upstream: Arc<dyn MetadataProvider>, store: Arc<dyn CacheStore>) -> Self {
        Self {
            upstream,
            cache: Cache::new(store),
            clock: Arc::new(SystemClock),
            ttl: default_cache_ttl(),
        }
    }

    pub fn with_ttl(mut self, ttl: chrono::Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Returns the cached answer while fresh, otherwise resolves from upstream
    /// and writes the new answer through to the cache.
    ///
    /// An empty resolution is cached like any other. Upstream failures are
    /// returned as-is; a stale entry is never served in their place.
    pub async fn resolve(&self, request: &WatchProviderRequest) -> AppResult<WatchProviderResolution> {
        let title_id = request.title_id.trim();
        if title_id.is_empty() {
            return Err(AppError::InvalidInput("tmdbId must not be empty".to_string()));
        }

        let key = CacheKey::watch_providers(request.media_type, title_id);

        if let Some(entry) = self.cache.get_fresh(&key, self.clock.now(), self.ttl).await {
            return Ok(entry.value);
        }

        let raw = self
            .upstream
            .fetch_watch_providers(request.media_type, title_id)
            .await?;

        let preferred = preferred_regions(
            request.region_override.as_deref(),
            request.region_hint.as_deref(),
        );

        let resolution = match resolve_region(&raw, &preferred) {
            Some(region) => {
                let availability = &raw[region];
                WatchProviderResolution {
                    resolved_region: Some(region.to_string()),
                    link: availability.link.clone(),
                    providers: normalize(availability, region),
                    free: availability.free.clone(),
                }
            }
            None => WatchProviderResolution::empty(),
        };

        tracing::info!(
            key = %key,
            preferred = ?preferred,
            resolved_region = ?resolution.resolved_region,
            providers = resolution.providers.len(),
            upstream = self.upstream.name(),
            "Watch providers resolved"
        );

        let entry = CacheEntry::new(resolution, self.clock.now());
        self.cache.put_or_log(&key, &entry, self.ttl).await;

        Ok(entry.value)
    }
}
