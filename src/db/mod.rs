pub mod cache;
pub mod redis;

pub use cache::{Cache, CacheEntry, CacheKey, CacheStore, InMemoryCacheStore};
pub use self::redis::{create_redis_client, RedisCacheStore};
