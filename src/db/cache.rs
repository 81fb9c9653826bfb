use std::fmt::Display;
use uuid::Uuid;

use crate::error::AppResult;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Recommendations(Uuid),
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::Recommendations(user_id) => write!(f, "recs:{}", user_id),
        }
    }
}

/// Key/value capability the recommendation cache is built on
///
/// Values are opaque serialized strings. Backends must honor the TTL passed to
/// `set` on a best-effort basis; callers still check expiry on read.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CacheStore: Send + Sync {
    /// Returns the stored value, or `None` when the key is absent
    async fn get(&self, key: &CacheKey) -> AppResult<Option<String>>;

    /// Stores a value with a time-to-live in seconds
    async fn set(&self, key: &CacheKey, value: String, ttl_secs: u64) -> AppResult<()>;

    /// Removes a key. Deleting an absent key is not an error.
    async fn delete(&self, key: &CacheKey) -> AppResult<()>;

    /// Backend name for logging
    fn name(&self) -> &'static str;
}
