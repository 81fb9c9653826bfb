use chrono::{Duration, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    db::{CacheKey, CacheStore},
    error::AppResult,
    models::{CachedRecommendations, RecommendedItem},
};

const SECONDS_PER_HOUR: u64 = 3600;

/// Cache-aside storage for per-user recommendation lists
///
/// The full list is stored; filtering and truncation happen on read so one
/// entry serves requests with different limits and exclusions.
#[derive(Clone)]
pub struct RecommendationCache {
    store: Arc<dyn CacheStore>,
}

impl RecommendationCache {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    /// Returns the cached list for `user_id`, filtered and truncated
    ///
    /// A missing, expired or unreadable entry is a miss. Expired entries are
    /// removed on the way out.
    pub async fn get(
        &self,
        user_id: Uuid,
        min_score: f64,
        exclude: &HashSet<Uuid>,
        limit: usize,
    ) -> AppResult<Option<Vec<RecommendedItem>>> {
        let key = CacheKey::Recommendations(user_id);
        let Some(payload) = self.store.get(&key).await? else {
            tracing::debug!(user_id = %user_id, backend = self.store.name(), "Cache miss");
            return Ok(None);
        };

        let entry: CachedRecommendations = match serde_json::from_str(&payload) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "Discarding unreadable cache entry");
                return Ok(None);
            }
        };

        if entry.is_expired_at(Utc::now()) {
            tracing::debug!(user_id = %user_id, expires_at = %entry.expires_at, "Cache entry expired");
            if let Err(e) = self.store.delete(&key).await {
                tracing::warn!(user_id = %user_id, error = %e, "Failed to remove expired cache entry");
            }
            return Ok(None);
        }

        tracing::debug!(user_id = %user_id, cached = entry.items.len(), "Cache hit");

        let items = entry
            .items
            .into_iter()
            .filter(|item| item.final_score >= min_score && !exclude.contains(&item.item_id))
            .take(limit)
            .collect();

        Ok(Some(items))
    }

    /// Stores the full list for `user_id`, valid for `ttl_hours`
    pub async fn set(
        &self,
        user_id: Uuid,
        items: &[RecommendedItem],
        ttl_hours: u32,
    ) -> AppResult<()> {
        let entry = CachedRecommendations {
            items: items.to_vec(),
            expires_at: Utc::now() + Duration::hours(i64::from(ttl_hours)),
        };
        let payload = serde_json::to_string(&entry)?;
        let ttl_secs = u64::from(ttl_hours) * SECONDS_PER_HOUR;

        self.store
            .set(&CacheKey::Recommendations(user_id), payload, ttl_secs)
            .await?;

        tracing::debug!(user_id = %user_id, count = items.len(), ttl_hours, "Cached recommendations");

        Ok(())
    }

    /// Drops the cached list for `user_id`; a no-op when nothing is cached
    pub async fn invalidate(&self, user_id: Uuid) -> AppResult<()> {
        self.store
            .delete(&CacheKey::Recommendations(user_id))
            .await?;
        tracing::info!(user_id = %user_id, "Recommendation cache invalidated");
        Ok(())
    }
}
