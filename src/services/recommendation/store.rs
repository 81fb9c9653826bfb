use std::collections::HashMap;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{ItemRow, ScoredItemRow},
};

/// Read access to the relational data the pipeline depends on
///
/// Each method is one round-trip. Score lookups are batched over the whole
/// candidate set so ranking never issues a query per item.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait RecommendationStore: Send + Sync {
    /// Items co-favorited by users sharing taste with `user_id`, scored by
    /// co-occurrence count. The user's own favorites are not returned.
    async fn collaborative_items(&self, user_id: Uuid, limit: usize)
        -> AppResult<Vec<ScoredItemRow>>;

    /// Newest items from shops the user follows
    async fn followed_shop_items(&self, user_id: Uuid, limit: usize) -> AppResult<Vec<ItemRow>>;

    /// Items recently favorited by users the user follows
    async fn followed_user_items(&self, user_id: Uuid, limit: usize) -> AppResult<Vec<ItemRow>>;

    /// Most engaged-with items overall, scored by engagement count
    async fn popular_items(&self, limit: usize) -> AppResult<Vec<ScoredItemRow>>;

    /// Popularity in 0..1 for each known id
    async fn popularity_scores(&self, item_ids: &[Uuid]) -> AppResult<HashMap<Uuid, f64>>;

    /// Freshness in 0..1 for each known id
    async fn freshness_scores(&self, item_ids: &[Uuid]) -> AppResult<HashMap<Uuid, f64>>;
}
