pub mod cache;
pub mod memory;
pub mod postgres;
pub mod redis;

pub use cache::{CacheKey, CacheStore};
pub use memory::MemoryCacheStore;
pub use postgres::{create_pool, run_migrations, PgCacheStore, PgRecommendationStore};
pub use self::redis::{create_redis_client, CacheWriterHandle, RedisCacheStore};
