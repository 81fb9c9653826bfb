use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use super::RecommendationStore;
use crate::{
    error::AppResult,
    models::{CandidateItem, CandidateSource},
};

/// Raw score given to items from followed shops
pub const SHOP_FOLLOW_SCORE: f64 = 3.0;
/// Raw score given to items surfaced through followed users
pub const USER_FOLLOW_SCORE: f64 = 2.0;

/// Builds the personalized candidate set for a user
///
/// Runs the collaborative, followed-shop and followed-user strategies
/// concurrently and merges their nominations. Excluded ids never appear and
/// the result holds at most `candidate_limit` entries, highest raw score first.
pub async fn generate_candidates(
    store: &dyn RecommendationStore,
    user_id: Uuid,
    candidate_limit: usize,
    exclude: &HashSet<Uuid>,
) -> AppResult<HashMap<Uuid, CandidateItem>> {
    let (collaborative, shop_items, user_items) = tokio::try_join!(
        store.collaborative_items(user_id, candidate_limit),
        store.followed_shop_items(user_id, candidate_limit),
        store.followed_user_items(user_id, candidate_limit),
    )?;

    tracing::debug!(
        user_id = %user_id,
        collaborative = collaborative.len(),
        shop_follow = shop_items.len(),
        user_follow = user_items.len(),
        "Candidate strategies completed"
    );

    let nominated = collaborative
        .into_iter()
        .map(|row| CandidateItem::from_row(row.item, row.score, CandidateSource::Collaborative))
        .chain(shop_items.into_iter().map(|row| {
            CandidateItem::from_row(row, SHOP_FOLLOW_SCORE, CandidateSource::ShopFollow)
        }))
        .chain(user_items.into_iter().map(|row| {
            CandidateItem::from_row(row, USER_FOLLOW_SCORE, CandidateSource::UserFollow)
        }));

    let mut candidates = merge_candidates(nominated, exclude);
    cap_candidates(&mut candidates, candidate_limit);

    Ok(candidates)
}

/// Popular items for users without a usable personalization signal
pub async fn cold_start_candidates(
    store: &dyn RecommendationStore,
    limit: usize,
    exclude: &HashSet<Uuid>,
) -> AppResult<Vec<CandidateItem>> {
    // Over-fetch so exclusions do not starve the result.
    let rows = store.popular_items(limit.saturating_add(exclude.len())).await?;

    let candidates: Vec<CandidateItem> = rows
        .into_iter()
        .filter(|row| !exclude.contains(&row.item.id))
        .map(|row| CandidateItem::from_row(row.item, row.score, CandidateSource::Popular))
        .take(limit)
        .collect();

    tracing::debug!(count = candidates.len(), "Cold-start candidates loaded");

    Ok(candidates)
}

/// Unions nominations by item id, keeping the highest raw score and every source
pub fn merge_candidates(
    nominated: impl IntoIterator<Item = CandidateItem>,
    exclude: &HashSet<Uuid>,
) -> HashMap<Uuid, CandidateItem> {
    let mut merged: HashMap<Uuid, CandidateItem> = HashMap::new();

    for candidate in nominated {
        if exclude.contains(&candidate.item_id) {
            continue;
        }
        match merged.get_mut(&candidate.item_id) {
            Some(existing) => existing.merge(candidate),
            None => {
                merged.insert(candidate.item_id, candidate);
            }
        }
    }

    merged
}

/// Deterministic ordering for a candidate map: raw score descending, then id
pub fn into_ordered(candidates: HashMap<Uuid, CandidateItem>) -> Vec<CandidateItem> {
    let mut ordered: Vec<CandidateItem> = candidates.into_values().collect();
    ordered.sort_by(|a, b| {
        b.total_score
            .partial_cmp(&a.total_score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.item_id.cmp(&b.item_id))
    });
    ordered
}

fn cap_candidates(candidates: &mut HashMap<Uuid, CandidateItem>, limit: usize) {
    if candidates.len() <= limit {
        return;
    }

    let kept = into_ordered(std::mem::take(candidates))
        .into_iter()
        .take(limit)
        .map(|c| (c.item_id, c));
    candidates.extend(kept);
}
