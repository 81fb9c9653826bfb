use std::cmp::Ordering;
use uuid::Uuid;

use super::RecommendationStore;
use crate::{
    error::AppResult,
    models::{CandidateItem, RankingWeights, RecommendedItem, ScoreBreakdown},
};

/// Popularity assumed for items the store has no score for
pub const DEFAULT_POPULARITY: f64 = 0.0;
/// Freshness assumed for items the store has no score for
pub const DEFAULT_FRESHNESS: f64 = 0.1;

/// Scores candidates and returns them best first
///
/// Popularity and freshness are fetched in one batched lookup each. Ties keep
/// their input order.
pub async fn rank_candidates(
    store: &dyn RecommendationStore,
    candidates: Vec<CandidateItem>,
    weights: &RankingWeights,
) -> AppResult<Vec<RecommendedItem>> {
    if candidates.is_empty() {
        return Ok(vec![]);
    }

    let item_ids: Vec<Uuid> = candidates.iter().map(|c| c.item_id).collect();
    let (popularity, freshness) = tokio::try_join!(
        store.popularity_scores(&item_ids),
        store.freshness_scores(&item_ids),
    )?;

    let raw: Vec<f64> = candidates.iter().map(|c| c.total_score).collect();
    let normalized = normalize_scores(&raw);

    let mut ranked: Vec<RecommendedItem> = candidates
        .into_iter()
        .zip(normalized)
        .map(|(candidate, cf)| {
            let pop = popularity
                .get(&candidate.item_id)
                .copied()
                .unwrap_or(DEFAULT_POPULARITY);
            let fresh = freshness
                .get(&candidate.item_id)
                .copied()
                .unwrap_or(DEFAULT_FRESHNESS);
            score_candidate(candidate, cf, pop, fresh, weights)
        })
        .collect();

    // Vec::sort_by is stable, which keeps input order among equal scores.
    ranked.sort_by(|a, b| {
        b.final_score
            .partial_cmp(&a.final_score)
            .unwrap_or(Ordering::Equal)
    });

    Ok(ranked)
}

/// Min-max normalizes raw scores into 0..1
///
/// When every score is equal the range is treated as 1, so all values become 0.
pub fn normalize_scores(scores: &[f64]) -> Vec<f64> {
    let min = scores.iter().copied().fold(f64::INFINITY, f64::min);
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = if max > min { max - min } else { 1.0 };

    scores.iter().map(|s| (s - min) / range).collect()
}

/// Blends the three signals into a recommended item
///
/// Each component is clamped at zero so a final score can never be pulled
/// below the sum of its parts.
pub fn score_candidate(
    candidate: CandidateItem,
    normalized_cf: f64,
    popularity: f64,
    freshness: f64,
    weights: &RankingWeights,
) -> RecommendedItem {
    let score_breakdown = ScoreBreakdown {
        collaborative: (normalized_cf * weights.collaborative).max(0.0),
        popularity: (popularity * weights.popularity).max(0.0),
        freshness: (freshness * weights.freshness).max(0.0),
    };

    RecommendedItem {
        item_id: candidate.item_id,
        name: candidate.name,
        image_url: candidate.image_url,
        shop_id: candidate.shop_id,
        shop_name: candidate.shop_name,
        shop_theme: candidate.shop_theme,
        final_score: score_breakdown.total(),
        score_breakdown,
        sources: candidate.sources,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CandidateSource, ItemRow};
    use crate::services::recommendation::MockRecommendationStore;
    use chrono::Utc;
    use std::collections::HashMap;

    fn candidate(score: f64) -> CandidateItem {
        CandidateItem::from_row(
            ItemRow {
                id: Uuid::new_v4(),
                name: "Item".to_string(),
                image_url: Some("items/1.png".to_string()),
                shop_id: Uuid::new_v4(),
                shop_name: "Shop".to_string(),
                shop_theme: None,
                created_at: Utc::now(),
            },
            score,
            CandidateSource::Collaborative,
        )
    }

    fn store_with(
        popularity: HashMap<Uuid, f64>,
        freshness: HashMap<Uuid, f64>,
    ) -> MockRecommendationStore {
        let mut store = MockRecommendationStore::new();
        store
            .expect_popularity_scores()
            .times(1)
            .returning(move |_| Ok(popularity.clone()));
        store
            .expect_freshness_scores()
            .times(1)
            .returning(move |_| Ok(freshness.clone()));
        store
    }

    #[test]
    fn test_normalize_bounds() {
        let normalized = normalize_scores(&[3.0, 5.0, 9.0]);
        assert_eq!(normalized, vec![0.0, 1.0 / 3.0, 1.0]);
    }

    #[test]
    fn test_normalize_small_range_still_reaches_one() {
        let normalized = normalize_scores(&[0.2, 0.5]);
        assert_eq!(normalized[0], 0.0);
        assert!((normalized[1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_normalize_equal_scores_are_zero() {
        assert_eq!(normalize_scores(&[4.0, 4.0, 4.0]), vec![0.0, 0.0, 0.0]);
        assert!(normalize_scores(&[]).is_empty());
    }

    #[tokio::test]
    async fn test_empty_candidates_skip_store() {
        let store = MockRecommendationStore::new();
        let ranked = rank_candidates(&store, vec![], &RankingWeights::default())
            .await
            .unwrap();
        assert!(ranked.is_empty());
    }

    #[tokio::test]
    async fn test_single_candidate_has_zero_collaborative_component() {
        let only = candidate(42.0);
        let id = only.item_id;
        let store = store_with(HashMap::from([(id, 0.5)]), HashMap::from([(id, 0.25)]));

        let ranked = rank_candidates(&store, vec![only], &RankingWeights::default())
            .await
            .unwrap();

        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].item_id, id);
        assert_eq!(ranked[0].score_breakdown.collaborative, 0.0);
        assert!((ranked[0].final_score - (0.5 * 0.3 + 0.25 * 0.2)).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_final_score_is_weighted_sum_and_sorted() {
        let low = candidate(1.0);
        let high = candidate(11.0);
        let (low_id, high_id) = (low.item_id, high.item_id);
        let store = store_with(
            HashMap::from([(low_id, 0.9), (high_id, 0.1)]),
            HashMap::from([(low_id, 0.8)]),
        );
        let weights = RankingWeights::new(0.5, 0.25, 0.25).unwrap();

        let ranked = rank_candidates(&store, vec![low, high], &weights)
            .await
            .unwrap();

        for item in &ranked {
            let b = item.score_breakdown;
            assert_eq!(item.final_score, b.collaborative + b.popularity + b.freshness);
            assert!(b.collaborative >= 0.0 && b.popularity >= 0.0 && b.freshness >= 0.0);
        }

        let high_ranked = ranked.iter().find(|r| r.item_id == high_id).unwrap();
        // Missing freshness falls back to the default.
        assert!((high_ranked.score_breakdown.freshness - DEFAULT_FRESHNESS * 0.25).abs() < 1e-12);
        assert!((high_ranked.final_score - (0.5 + 0.025 + 0.025)).abs() < 1e-12);

        let low_ranked = ranked.iter().find(|r| r.item_id == low_id).unwrap();
        assert!((low_ranked.final_score - (0.0 + 0.225 + 0.2)).abs() < 1e-12);

        assert_eq!(ranked[0].item_id, high_id);
        assert!(ranked[0].final_score >= ranked[1].final_score);
    }

    #[tokio::test]
    async fn test_ties_keep_input_order() {
        let first = candidate(2.0);
        let second = candidate(2.0);
        let (first_id, second_id) = (first.item_id, second.item_id);
        let store = store_with(HashMap::new(), HashMap::new());

        let ranked = rank_candidates(&store, vec![first, second], &RankingWeights::default())
            .await
            .unwrap();

        assert_eq!(ranked[0].item_id, first_id);
        assert_eq!(ranked[1].item_id, second_id);
        assert_eq!(ranked[0].final_score, DEFAULT_FRESHNESS * 0.2);
    }
}
