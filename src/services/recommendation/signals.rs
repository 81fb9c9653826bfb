//! Popularity and freshness signals in the 0..1 range.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use uuid::Uuid;

/// Age at which an item's freshness has halved
pub const FRESHNESS_HALF_LIFE_DAYS: f64 = 7.0;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Exponential decay on item age; items from the future count as brand new
pub fn freshness_score(created_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let age_days = (now - created_at).num_seconds().max(0) as f64 / SECONDS_PER_DAY;
    0.5_f64
        .powf(age_days / FRESHNESS_HALF_LIFE_DAYS)
        .clamp(0.0, 1.0)
}

/// Log-scaled engagement relative to the most engaged item in the batch
pub fn popularity_scores(engagement: &[(Uuid, i64)]) -> HashMap<Uuid, f64> {
    let max = engagement.iter().map(|(_, count)| *count).max().unwrap_or(0);

    engagement
        .iter()
        .map(|(id, count)| {
            let score = if max <= 0 {
                0.0
            } else {
                ((*count).max(0) as f64).ln_1p() / (max as f64).ln_1p()
            };
            (*id, score)
        })
        .collect()
}
