//! Recommendation pipeline
//!
//! Candidate generation, ranking, the diversity pass and the cache-aside
//! layer, sequenced by [`RecommendationEngine`]. Every stage works on small
//! in-memory collections; the relational store and the cache backend are
//! reached through the [`RecommendationStore`] and [`CacheStore`] traits.

pub mod cache;
pub mod candidates;
pub mod diversity;
pub mod ranking;
pub mod signals;
mod store;

use std::collections::HashSet;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    db::CacheStore,
    error::AppResult,
    models::{
        CacheOptions, DiversityOptions, RankingWeights, RecommendationOptions, RecommendedItem,
    },
};

pub use cache::RecommendationCache;
pub use diversity::{apply_diversity, DiversityOutcome};
pub use store::RecommendationStore;

#[cfg(test)]
pub use store::MockRecommendationStore;

/// Below this many personalized candidates the list is padded with popular items
pub const MIN_CANDIDATES: usize = 10;

/// Tunables for the whole pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Upper bound on candidates considered per request
    pub candidate_limit: usize,
    /// Weights for users with a personalized candidate set
    pub weights: RankingWeights,
    /// Weights for anonymous users
    pub cold_start_weights: RankingWeights,
    pub diversity: DiversityOptions,
    pub cache: CacheOptions,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            candidate_limit: 1000,
            weights: RankingWeights::default(),
            cold_start_weights: RankingWeights::cold_start(),
            diversity: DiversityOptions::default(),
            cache: CacheOptions::default(),
        }
    }
}

/// End-to-end recommendation pipeline
#[derive(Clone)]
pub struct RecommendationEngine {
    store: Arc<dyn RecommendationStore>,
    cache: RecommendationCache,
    config: EngineConfig,
}

impl RecommendationEngine {
    pub fn new(
        store: Arc<dyn RecommendationStore>,
        cache_store: Arc<dyn CacheStore>,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            cache: RecommendationCache::new(cache_store),
            config,
        }
    }

    /// Produces up to `options.limit` recommendations for a user
    ///
    /// Anonymous users get ranked popular items and are never cached.
    /// Store failures propagate; cache failures only cost a recomputation.
    #[instrument(skip(self, options), fields(limit = options.limit, use_cache = options.use_cache))]
    pub async fn generate_recommendations(
        &self,
        user_id: Option<Uuid>,
        options: &RecommendationOptions,
    ) -> AppResult<Vec<RecommendedItem>> {
        let Some(user_id) = user_id else {
            return self.cold_start(options).await;
        };

        if options.use_cache {
            match self
                .cache
                .get(
                    user_id,
                    options.min_score,
                    &options.exclude_item_ids,
                    options.limit,
                )
                .await
            {
                Ok(Some(items)) => return Ok(items),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(user_id = %user_id, error = %e, "Cache read failed, recomputing");
                }
            }
        }

        self.personalized(user_id, options).await
    }

    /// Forgets the cached list for a user whose follow or favorite graph changed
    pub async fn invalidate_cache(&self, user_id: Uuid) -> AppResult<()> {
        self.cache.invalidate(user_id).await
    }

    async fn cold_start(&self, options: &RecommendationOptions) -> AppResult<Vec<RecommendedItem>> {
        let candidates = candidates::cold_start_candidates(
            self.store.as_ref(),
            self.config.candidate_limit,
            &options.exclude_item_ids,
        )
        .await?;

        let ranked = ranking::rank_candidates(
            self.store.as_ref(),
            candidates,
            &self.config.cold_start_weights,
        )
        .await?;
        let outcome = self.diversify(ranked, None);

        Ok(finalize(outcome.items, options))
    }

    async fn personalized(
        &self,
        user_id: Uuid,
        options: &RecommendationOptions,
    ) -> AppResult<Vec<RecommendedItem>> {
        // A cached list is shared by later requests with other exclusions.
        let no_exclusions = HashSet::new();
        let exclude = if options.use_cache {
            &no_exclusions
        } else {
            &options.exclude_item_ids
        };

        let generated = candidates::generate_candidates(
            self.store.as_ref(),
            user_id,
            self.config.candidate_limit,
            exclude,
        )
        .await?;
        let mut ordered = candidates::into_ordered(generated);

        let augmented = ordered.len() < MIN_CANDIDATES;
        if augmented {
            let mut skip: HashSet<Uuid> = ordered.iter().map(|c| c.item_id).collect();
            skip.extend(exclude.iter().copied());

            let extra = candidates::cold_start_candidates(
                self.store.as_ref(),
                self.config.candidate_limit.saturating_sub(ordered.len()),
                &skip,
            )
            .await?;

            tracing::info!(
                user_id = %user_id,
                personalized = ordered.len(),
                cold_start = extra.len(),
                "Sparse candidate set, blending in popular items"
            );
            ordered.extend(extra);
        }

        let ranked =
            ranking::rank_candidates(self.store.as_ref(), ordered, &self.config.weights).await?;
        let outcome = self.diversify(ranked, Some(user_id));

        if options.use_cache {
            let ttl_hours = if augmented {
                self.config.cache.cold_start_ttl_hours
            } else {
                self.config.cache.full_ttl_hours
            };
            if let Err(e) = self.cache.set(user_id, &outcome.items, ttl_hours).await {
                tracing::warn!(user_id = %user_id, error = %e, "Failed to cache recommendations");
            }
        }

        Ok(finalize(outcome.items, options))
    }

    fn diversify(&self, ranked: Vec<RecommendedItem>, user_id: Option<Uuid>) -> DiversityOutcome {
        let ranked_count = ranked.len();
        let outcome = apply_diversity(ranked, &self.config.diversity);

        if outcome.dropped_unplaceable > 0 {
            tracing::warn!(
                user_id = ?user_id,
                dropped = outcome.dropped_unplaceable,
                "Deferred items had no valid position"
            );
        }
        tracing::debug!(
            user_id = ?user_id,
            ranked = ranked_count,
            kept = outcome.items.len(),
            over_cap = outcome.dropped_over_cap,
            "Diversity pass completed"
        );

        outcome
    }
}

fn finalize(items: Vec<RecommendedItem>, options: &RecommendationOptions) -> Vec<RecommendedItem> {
    items
        .into_iter()
        .filter(|item| item.final_score >= options.min_score)
        .filter(|item| !options.exclude_item_ids.contains(&item.item_id))
        .take(options.limit)
        .collect()
}
