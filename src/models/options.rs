use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Weights blended into a final recommendation score
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RankingWeights {
    /// Weight of the normalized collaborative score
    pub collaborative: f64,
    /// Weight of the popularity signal (0..1)
    pub popularity: f64,
    /// Weight of the freshness signal (0..1)
    pub freshness: f64,
}

impl RankingWeights {
    /// Creates weights, rejecting negative or non-finite components
    pub fn new(collaborative: f64, popularity: f64, freshness: f64) -> AppResult<Self> {
        for (name, value) in [
            ("collaborative", collaborative),
            ("popularity", popularity),
            ("freshness", freshness),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(AppError::InvalidInput(format!(
                    "{} weight must be a non-negative number, got {}",
                    name, value
                )));
            }
        }

        Ok(Self {
            collaborative,
            popularity,
            freshness,
        })
    }

    /// Weights for users with no usable personalization signal.
    ///
    /// Collaborative evidence is discounted in favor of proven popularity.
    pub fn cold_start() -> Self {
        Self {
            collaborative: 0.2,
            popularity: 0.5,
            freshness: 0.3,
        }
    }
}

impl Default for RankingWeights {
    fn default() -> Self {
        Self {
            collaborative: 0.4,
            popularity: 0.3,
            freshness: 0.2,
        }
    }
}

/// Constraints applied when re-ordering a ranked list
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DiversityOptions {
    /// Maximum items from one shop in a single list; 0 disables the cap
    pub max_items_per_shop: usize,
    /// Forbid two adjacent entries from the same shop
    pub no_consecutive_shops: bool,
}

impl Default for DiversityOptions {
    fn default() -> Self {
        Self {
            max_items_per_shop: 3,
            no_consecutive_shops: true,
        }
    }
}

/// Time-to-live settings for cached recommendation lists
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CacheOptions {
    /// TTL for lists produced from a full candidate set
    pub full_ttl_hours: u32,
    /// TTL for lists that had to be padded with cold-start items
    pub cold_start_ttl_hours: u32,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            full_ttl_hours: 12,
            cold_start_ttl_hours: 6,
        }
    }
}

/// Per-request options for generating recommendations
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationOptions {
    pub limit: usize,
    pub exclude_item_ids: HashSet<Uuid>,
    pub use_cache: bool,
    pub min_score: f64,
}

impl Default for RecommendationOptions {
    fn default() -> Self {
        Self {
            limit: 20,
            exclude_item_ids: HashSet::new(),
            use_cache: true,
            min_score: 0.0,
        }
    }
}
