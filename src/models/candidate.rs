use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Strategy that nominated a candidate item
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum CandidateSource {
    /// Item co-favorited by users with overlapping taste
    Collaborative,
    /// Item from a shop the user follows
    ShopFollow,
    /// Item surfaced through a user the user follows
    UserFollow,
    /// Broadly popular item, no personalization signal
    Popular,
}

/// Item plus owning shop, as read from the relational store
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct ItemRow {
    pub id: Uuid,
    pub name: String,
    pub image_url: Option<String>,
    pub shop_id: Uuid,
    pub shop_name: String,
    pub shop_theme: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Item row carrying a strategy-specific raw score
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct ScoredItemRow {
    #[sqlx(flatten)]
    pub item: ItemRow,
    pub score: f64,
}

/// An item eligible for recommendation, before ranking
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateItem {
    pub item_id: Uuid,
    pub name: String,
    pub image_url: Option<String>,
    pub shop_id: Uuid,
    pub shop_name: String,
    pub shop_theme: Option<String>,
    /// Raw collaborative score, only comparable within one candidate set
    pub total_score: f64,
    pub created_at: DateTime<Utc>,
    pub sources: BTreeSet<CandidateSource>,
}

impl CandidateItem {
    pub fn from_row(row: ItemRow, score: f64, source: CandidateSource) -> Self {
        Self {
            item_id: row.id,
            name: row.name,
            image_url: row.image_url,
            shop_id: row.shop_id,
            shop_name: row.shop_name,
            shop_theme: row.shop_theme,
            total_score: score,
            created_at: row.created_at,
            sources: BTreeSet::from([source]),
        }
    }

    /// Folds a duplicate nomination into this candidate.
    ///
    /// The higher raw score wins and source tags are unioned.
    pub fn merge(&mut self, other: CandidateItem) {
        debug_assert_eq!(self.item_id, other.item_id);
        if other.total_score > self.total_score {
            self.total_score = other.total_score;
        }
        self.sources.extend(other.sources);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: Uuid) -> ItemRow {
        ItemRow {
            id,
            name: "Vintage lamp".to_string(),
            image_url: None,
            shop_id: Uuid::new_v4(),
            shop_name: "Attic".to_string(),
            shop_theme: Some("amber".to_string()),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_merge_keeps_highest_score_and_unions_sources() {
        let id = Uuid::new_v4();
        let mut a = CandidateItem::from_row(row(id), 2.0, CandidateSource::UserFollow);
        let b = CandidateItem::from_row(row(id), 5.0, CandidateSource::Collaborative);

        a.merge(b);

        assert_eq!(a.total_score, 5.0);
        assert!(a.sources.contains(&CandidateSource::UserFollow));
        assert!(a.sources.contains(&CandidateSource::Collaborative));
    }

    #[test]
    fn test_merge_does_not_lower_score() {
        let id = Uuid::new_v4();
        let mut a = CandidateItem::from_row(row(id), 3.0, CandidateSource::ShopFollow);
        let b = CandidateItem::from_row(row(id), 1.0, CandidateSource::Collaborative);

        a.merge(b);

        assert_eq!(a.total_score, 3.0);
        assert_eq!(a.sources.len(), 2);
    }

    #[test]
    fn test_source_serialization() {
        let json = serde_json::to_string(&CandidateSource::ShopFollow).unwrap();
        assert_eq!(json, "\"shop_follow\"");
    }
}
