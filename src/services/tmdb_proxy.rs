use serde_json::Value;
use std::sync::Arc;

use crate::{
    db::{Cache, CacheEntry, CacheKey, CacheStore},
    error::AppResult,
    services::{
        clock::{Clock, SystemClock},
        providers::MetadataProvider,
    },
};

/// Default freshness window for pass-through TMDB responses
pub fn default_proxy_ttl() -> chrono::Duration {
    chrono::Duration::hours(1)
}

/// Pass-through TMDB reads, each successful response cached for `ttl`
pub struct TmdbProxyService {
    upstream: Arc<dyn MetadataProvider>,
    cache: Cache,
    clock: Arc<dyn Clock>,
    ttl: chrono::Duration,
}

impl TmdbProxyService {
    pub fn new(upstream: Arc<dyn MetadataProvider>, store: Arc<dyn CacheStore>) -> Self {
        Self {
            upstream,
            cache: Cache::new(store),
            clock: Arc::new(SystemClock),
            ttl: default_proxy_ttl(),
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

    /// Failures are returned uncached so the next call retries upstream
    pub async fn fetch(&self, path: &str, query: &[(String, String)]) -> AppResult<Value> {
        let key = CacheKey::tmdb_proxy(path, query);

        if let Some(entry) = self.cache.get_fresh(&key, self.clock.now(), self.ttl).await {
            return Ok(entry.value);
        }

        let body = self.upstream.fetch_json(path, query).await?;

        let entry = CacheEntry::new(body, self.clock.now());
        self.cache.put_or_log(&key, &entry, self.ttl).await;

        Ok(entry.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemoryCacheStore;
    use crate::error::AppError;
    use crate::services::clock::FixedClock;
    use crate::services::providers::MockMetadataProvider;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn upstream_returning(body: Value, times: usize) -> MockMetadataProvider {
        let mut upstream = MockMetadataProvider::new();
        upstream
            .expect_fetch_json()
            .times(times)
            .returning(move |_, _| Ok(body.clone()));
        upstream
    }

    #[tokio::test]
    async fn test_identical_requests_hit_upstream_once() {
        let body = json!({ "page": 1, "results": [{ "id": 550 }] });
        let svc = TmdbProxyService::new(
            Arc::new(upstream_returning(body.clone(), 1)),
            Arc::new(InMemoryCacheStore::new()),
        );

        let first = svc
            .fetch("search/movie", &params(&[("query", "fight"), ("page", "1")]))
            .await
            .unwrap();
        let second = svc
            .fetch("search/movie", &params(&[("page", "1"), ("query", "fight")]))
            .await
            .unwrap();

        assert_eq!(first, body);
        assert_eq!(second, body);
    }

    #[tokio::test]
    async fn test_different_params_are_cached_separately() {
        let svc = TmdbProxyService::new(
            Arc::new(upstream_returning(json!({ "results": [] }), 2)),
            Arc::new(InMemoryCacheStore::new()),
        );

        svc.fetch("discover/movie", &params(&[("page", "1")]))
            .await
            .unwrap();
        svc.fetch("discover/movie", &params(&[("page", "2")]))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_response_expires_after_an_hour() {
        let clock = FixedClock::at(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap());
        let svc = TmdbProxyService::new(
            Arc::new(upstream_returning(json!({ "results": [] }), 2)),
            Arc::new(InMemoryCacheStore::new()),
        )
        .with_clock(clock.clone());

        svc.fetch("trending/all/week", &[]).await.unwrap();
        clock.advance(chrono::Duration::minutes(59));
        svc.fetch("trending/all/week", &[]).await.unwrap();
        clock.advance(chrono::Duration::minutes(1));
        svc.fetch("trending/all/week", &[]).await.unwrap();
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let mut upstream = MockMetadataProvider::new();
        let mut seq = mockall::Sequence::new();
        upstream
            .expect_fetch_json()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Err(AppError::UpstreamUnavailable("TMDB returned status 503".to_string())));
        upstream
            .expect_fetch_json()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(json!({ "results": [{ "id": 603 }] })));

        let store = Arc::new(InMemoryCacheStore::new());
        let svc = TmdbProxyService::new(Arc::new(upstream), store.clone());

        assert!(svc.fetch("movie/603", &[]).await.is_err());
        assert!(store.is_empty().await);

        let body = svc.fetch("movie/603", &[]).await.unwrap();
        assert_eq!(body["results"][0]["id"], 603);
    }
}
