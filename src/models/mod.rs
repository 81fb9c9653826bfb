pub mod candidate;
pub mod options;
pub mod recommendation;

pub use candidate::{CandidateItem, CandidateSource, ItemRow, ScoredItemRow};
pub use options::{CacheOptions, DiversityOptions, RankingWeights, RecommendationOptions};
pub use recommendation::{CachedRecommendations, RecommendedItem, ScoreBreakdown};
