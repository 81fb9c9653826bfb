pub mod recommendation;

pub use recommendation::{EngineConfig, RecommendationEngine, RecommendationStore};
