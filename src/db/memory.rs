use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

use crate::db::cache::{CacheKey, CacheStore};
use crate::error::AppResult;

/// In-process cache store
///
/// Useful for single-instance deployments and tests. Entries are evicted
/// lazily when read after their deadline.
#[derive(Default)]
pub struct MemoryCacheStore {
    entries: RwLock<HashMap<CacheKey, (String, Instant)>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries currently held, expired or not
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Returns the live value for `key`, removing it only if it is still expired
fn evict_if_expired(
    entries: &mut HashMap<CacheKey, (String, Instant)>,
    key: &CacheKey,
    now: Instant,
) -> Option<String> {
    match entries.get(key) {
        Some((value, deadline)) if now < *deadline => Some(value.clone()),
        Some(_) => {
            entries.remove(key);
            None
        }
        None => None,
    }
}

#[async_trait::async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &CacheKey) -> AppResult<Option<String>> {
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some((value, deadline)) if Instant::now() < *deadline => {
                    return Ok(Some(value.clone()))
                }
                Some(_) => {}
                None => return Ok(None),
            }
        }

        // A set may have landed between the two locks.
        let mut entries = self.entries.write().await;
        Ok(evict_if_expired(&mut entries, key, Instant::now()))
    }

    async fn set(&self, key: &CacheKey, value: String, ttl_secs: u64) -> AppResult<()> {
        let deadline = Instant::now() + Duration::from_secs(ttl_secs);
        self.entries
            .write()
            .await
            .insert(key.clone(), (value, deadline));
        Ok(())
    }

    async fn delete(&self, key: &CacheKey) -> AppResult<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
