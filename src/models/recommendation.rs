use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

use super::CandidateSource;

/// Weighted contributions that make up a final score
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct ScoreBreakdown {
    pub collaborative: f64,
    pub popularity: f64,
    pub freshness: f64,
}

impl ScoreBreakdown {
    pub fn total(&self) -> f64 {
        self.collaborative + self.popularity + self.freshness
    }
}

/// A ranked, display-ready recommendation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecommendedItem {
    pub item_id: Uuid,
    pub name: String,
    pub image_url: Option<String>,
    pub shop_id: Uuid,
    pub shop_name: String,
    pub shop_theme: Option<String>,
    pub final_score: f64,
    pub score_breakdown: ScoreBreakdown,
    #[serde(default)]
    pub sources: BTreeSet<CandidateSource>,
}

/// Cached recommendation list for one user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CachedRecommendations {
    pub items: Vec<RecommendedItem>,
    pub expires_at: DateTime<Utc>,
}

impl CachedRecommendations {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}
