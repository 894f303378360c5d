use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Display;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{AppError, AppResult};
use crate::models::MediaType;

/// Cache key types
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Resolved watch providers for one title
    WatchProviders { media_type: MediaType, title_id: String },
    /// A pass-through TMDB response; `query` is kept sorted
    TmdbProxy {
        path: String,
        query: Vec<(String, String)>,
    },
}

impl CacheKey {
    pub fn watch_providers(media_type: MediaType, title_id: impl Into<String>) -> Self {
        Self::WatchProviders {
            media_type,
            title_id: title_id.into(),
        }
    }

    /// Parameter order does not matter: `?a=1&b=2` and `?b=2&a=1` share a key
    pub fn tmdb_proxy(path: impl Into<String>, query: &[(String, String)]) -> Self {
        let mut query = query.to_vec();
        query.sort();
        Self::TmdbProxy {
            path: path.into(),
            query,
        }
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::WatchProviders {
                media_type,
                title_id,
            } => write!(f, "watch-providers:{}:{}", media_type, title_id),
            CacheKey::TmdbProxy { path, query } => {
                // JSON keeps `&` and `=` inside values from colliding with separators
                let query = serde_json::to_string(query).map_err(|_| std::fmt::Error)?;
                write!(f, "tmdb:{}:{}", path, query)
            }
        }
    }
}

/// A stored value. Always replaced whole, never patched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub value: T,
    pub cached_at: DateTime<Utc>,
}

impl<T> CacheEntry<T> {
    pub fn new(value: T, cached_at: DateTime<Utc>) -> Self {
        Self { value, cached_at }
    }

    /// An entry is fresh while strictly less than `ttl` has elapsed since it was cached
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: chrono::Duration) -> bool {
        now.signed_duration_since(self.cached_at) < ttl
    }
}

/// Keyed persistence for serialized cache entries.
///
/// Stores only get and put; freshness is decided by the caller at read time.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &CacheKey) -> AppResult<Option<String>>;

    /// Unconditionally replaces whatever is stored under `key`.
    /// `expire_after` is a hint for reclaiming space, not a freshness rule.
    async fn put(&self, key: &CacheKey, value: String, expire_after: chrono::Duration) -> AppResult<()>;

    /// Store name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Typed JSON access to a [`CacheStore`]
#[derive(Clone)]
pub struct Cache {
    store: Arc<dyn CacheStore>,
}

impl Cache {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    pub fn name(&self) -> &'static str {
        self.store.name()
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &CacheKey) -> AppResult<Option<CacheEntry<T>>> {
        match self.store.get(key).await? {
            Some(json) => {
                let entry = serde_json::from_str(&json).map_err(|e| {
                    AppError::Internal(format!("Cache deserialization error: {}", e))
                })?;
                Ok(Some(entry))
            }
            None => Ok(None),
        }
    }

    pub async fn put<T: Serialize>(
        &self,
        key: &CacheKey,
        entry: &CacheEntry<T>,
        expire_after: chrono::Duration,
    ) -> AppResult<()> {
        let json = serde_json::to_string(entry)
            .map_err(|e| AppError::Internal(format!("Cache serialization error: {}", e)))?;
        self.store.put(key, json, expire_after).await
    }

    /// Returns the entry only while fresh. Read failures degrade to a miss.
    pub async fn get_fresh<T: DeserializeOwned>(
        &self,
        key: &CacheKey,
        now: DateTime<Utc>,
        ttl: chrono::Duration,
    ) -> Option<CacheEntry<T>> {
        match self.get::<T>(key).await {
            Ok(Some(entry)) if entry.is_fresh(now, ttl) => {
                tracing::debug!(key = %key, "Cache hit");
                Some(entry)
            }
            Ok(Some(entry)) => {
                tracing::debug!(key = %key, cached_at = %entry.cached_at, "Cache entry stale");
                None
            }
            Ok(None) => {
                tracing::debug!(key = %key, "Cache miss");
                None
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    key = %key,
                    store = self.name(),
                    "Cache read failed, fetching from upstream"
                );
                None
            }
        }
    }

    /// Write failures are logged and swallowed
    pub async fn put_or_log<T: Serialize>(
        &self,
        key: &CacheKey,
        entry: &CacheEntry<T>,
        expire_after: chrono::Duration,
    ) {
        if let Err(e) = self.put(key, entry, expire_after).await {
            tracing::error!(
                error = %e,
                key = %key,
                store = self.name(),
                "Failed to write cache entry"
            );
        }
    }
}

/// Process-local store, used when no Redis URL is configured and in tests
#[derive(Clone, Default)]
pub struct InMemoryCacheStore {
    entries: Arc<RwLock<HashMap<CacheKey, String>>>,
}

impl InMemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn get(&self, key: &CacheKey) -> AppResult<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    // Nothing is evicted; stale entries are simply overwritten on the next miss
    async fn put(&self, key: &CacheKey, value: String, _expire_after: chrono::Duration) -> AppResult<()> {
        self.entries.write().await.insert(key.clone(), value);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WatchProviderResolution;
    use chrono::TimeZone;
    use mockall::predicate::always;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn ttl() -> chrono::Duration {
        chrono::Duration::hours(24)
    }

    #[test]
    fn test_cache_key_display() {
        let key = CacheKey::watch_providers(MediaType::Movie, "550");
        assert_eq!(format!("{}", key), "watch-providers:movie:550");
    }

    #[test]
    fn test_cache_key_is_per_media_type() {
        let movie = CacheKey::watch_providers(MediaType::Movie, "1399");
        let tv = CacheKey::watch_providers(MediaType::Tv, "1399");
        assert_ne!(movie, tv);
        assert_eq!(format!("{}", tv), "watch-providers:tv:1399");
    }

    #[test]
    fn test_proxy_key_ignores_parameter_order() {
        let a = CacheKey::tmdb_proxy(
            "discover/movie",
            &[
                ("with_genres".to_string(), "28".to_string()),
                ("page".to_string(), "2".to_string()),
            ],
        );
        let b = CacheKey::tmdb_proxy(
            "discover/movie",
            &[
                ("page".to_string(), "2".to_string()),
                ("with_genres".to_string(), "28".to_string()),
            ],
        );
        assert_eq!(a, b);
        assert_eq!(
            format!("{}", a),
            r#"tmdb:discover/movie:[["page","2"],["with_genres","28"]]"#
        );
    }

    #[test]
    fn test_proxy_key_keeps_separators_in_values_apart() {
        let joined = CacheKey::tmdb_proxy(
            "search/movie",
            &[("query".to_string(), "a&page=2".to_string())],
        );
        let split = CacheKey::tmdb_proxy(
            "search/movie",
            &[
                ("query".to_string(), "a".to_string()),
                ("page".to_string(), "2".to_string()),
            ],
        );
        assert_ne!(format!("{}", joined), format!("{}", split));
    }

    #[test]
    fn test_is_fresh_ttl_boundary() {
        let ms = chrono::Duration::milliseconds(1);

        let stale = CacheEntry::new(WatchProviderResolution::empty(), now() - ttl() - ms);
        let fresh = CacheEntry::new(WatchProviderResolution::empty(), now() - ttl() + ms);
        let exact = CacheEntry::new(WatchProviderResolution::empty(), now() - ttl());

        assert!(!stale.is_fresh(now(), ttl()));
        assert!(fresh.is_fresh(now(), ttl()));
        assert!(!exact.is_fresh(now(), ttl()));
    }

    #[test]
    fn test_cache_entry_serde_shape() {
        let entry = CacheEntry::new(
            WatchProviderResolution {
                resolved_region: Some("US".to_string()),
                ..Default::default()
            },
            now(),
        );

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["value"]["resolved_region"], "US");
        assert!(json["value"]["providers"].as_array().unwrap().is_empty());
        assert!(json.get("cached_at").is_some());

        let back: CacheEntry<WatchProviderResolution> = serde_json::from_value(json).unwrap();
        assert_eq!(back, entry);
    }

    #[tokio::test]
    async fn test_in_memory_get_missing() {
        let store = InMemoryCacheStore::new();
        let key = CacheKey::watch_providers(MediaType::Movie, "550");
        assert_eq!(store.get(&key).await.unwrap(), None);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let store = Arc::new(InMemoryCacheStore::new());
        let cache = Cache::new(store.clone());
        let key = CacheKey::watch_providers(MediaType::Tv, "1399");

        let first = CacheEntry::new(
            WatchProviderResolution {
                resolved_region: Some("GB".to_string()),
                ..Default::default()
            },
            now(),
        );
        let second = CacheEntry::new(WatchProviderResolution::empty(), now());

        cache.put(&key, &first, ttl()).await.unwrap();
        cache.put(&key, &second, ttl()).await.unwrap();

        assert_eq!(cache.get(&key).await.unwrap(), Some(second));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_get_fresh_skips_stale_entry() {
        let cache = Cache::new(Arc::new(InMemoryCacheStore::new()));
        let key = CacheKey::tmdb_proxy("trending/all/week", &[]);
        let body = serde_json::json!({ "results": [{ "id": 550 }] });

        cache
            .put(&key, &CacheEntry::new(body.clone(), now()), ttl())
            .await
            .unwrap();

        let hit = cache.get_fresh::<serde_json::Value>(&key, now(), ttl()).await;
        assert_eq!(hit.map(|entry| entry.value), Some(body));

        let later = now() + ttl();
        assert!(cache
            .get_fresh::<serde_json::Value>(&key, later, ttl())
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_undecodable_entry_is_a_miss() {
        let mut store = MockCacheStore::new();
        store
            .expect_get()
            .returning(|_| Ok(Some("not json".to_string())));
        store.expect_name().return_const("mock");

        let cache = Cache::new(Arc::new(store));
        let key = CacheKey::watch_providers(MediaType::Movie, "550");

        assert!(matches!(
            cache.get::<WatchProviderResolution>(&key).await,
            Err(AppError::Internal(_))
        ));
        assert!(cache
            .get_fresh::<WatchProviderResolution>(&key, now(), ttl())
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_put_or_log_swallows_store_error() {
        let mut store = MockCacheStore::new();
        store
            .expect_put()
            .with(always(), always(), always())
            .times(1)
            .returning(|_, _, _| Err(AppError::Internal("connection refused".to_string())));
        store.expect_name().return_const("mock");

        let cache = Cache::new(Arc::new(store));
        let key = CacheKey::watch_providers(MediaType::Movie, "550");

        cache
            .put_or_log(&key, &CacheEntry::new(WatchProviderResolution::empty(), now()), ttl())
            .await;
    }
}
