use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use redis::Client;

use crate::db::cache::{CacheKey, CacheStore};
use crate::error::AppResult;

/// Creates a Redis client for caching
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// Redis-backed store for cache entries.
///
/// Entries are JSON documents under the key's display form. Redis expiry only
/// reclaims space; freshness is still decided from `cached_at`.
#[derive(Clone)]
pub struct RedisCacheStore {
    conn: ConnectionManager,
}

impl RedisCacheStore {
    /// Connects once; the manager reconnects on its own after a dropped connection
    pub async fn new(redis_client: Client) -> AppResult<Self> {
        let conn = redis_client.get_connection_manager().await?;
        Ok(Self { conn })
    }
}

#[async_trait::async_trait]
impl CacheStore for RedisCacheStore {
    async fn get(&self, key: &CacheKey) -> AppResult<Option<String>> {
        let mut conn = self.conn.clone();
        let cached: Option<String> = conn.get(key.to_string()).await?;
        Ok(cached)
    }

    /// Returns once Redis has acknowledged the write
    async fn put(&self, key: &CacheKey, value: String, expire_after: chrono::Duration) -> AppResult<()> {
        let expire_secs = expire_after.num_seconds().max(1) as u64;
        let mut conn = self.conn.clone();
        let _: () = conn.set_ex(key.to_string(), value, expire_secs).await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}
