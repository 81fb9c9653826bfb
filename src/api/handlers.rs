use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use std::collections::HashSet;
use uuid::Uuid;

use super::AppState;
use crate::{
    error::{AppError, AppResult},
    middleware::RequestId,
    models::{RecommendationOptions, RecommendedItem},
};

/// Largest page a client may request
pub const MAX_LIMIT: usize = 100;

#[derive(Debug, Deserialize)]
pub struct RecommendationQuery {
    pub user_id: Option<Uuid>,
    pub limit: Option<usize>,
    /// Comma-separated item ids to leave out
    pub exclude: Option<String>,
    pub use_cache: Option<bool>,
    pub min_score: Option<f64>,
}

impl RecommendationQuery {
    fn into_options(self) -> AppResult<RecommendationOptions> {
        let defaults = RecommendationOptions::default();

        let exclude_item_ids = match self.exclude.as_deref() {
            Some(raw) => parse_id_list(raw)?,
            None => HashSet::new(),
        };

        let min_score = self.min_score.unwrap_or(defaults.min_score);
        if !min_score.is_finite() {
            return Err(AppError::InvalidInput(
                "min_score must be a finite number".to_string(),
            ));
        }

        Ok(RecommendationOptions {
            limit: self.limit.unwrap_or(defaults.limit).min(MAX_LIMIT),
            exclude_item_ids,
            use_cache: self.use_cache.unwrap_or(defaults.use_cache),
            min_score,
        })
    }
}

fn parse_id_list(raw: &str) -> AppResult<HashSet<Uuid>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            Uuid::parse_str(s)
                .map_err(|_| AppError::InvalidInput(format!("Invalid item id: {}", s)))
        })
        .collect()
}

/// Handler for the recommendations endpoint
///
/// Recommendations are an optional page enhancement, so pipeline failures are
/// logged and answered with an empty list instead of an error status.
pub async fn get_recommendations(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Query(query): Query<RecommendationQuery>,
) -> AppResult<Json<Vec<RecommendedItem>>> {
    let user_id = query.user_id;
    let options = query.into_options()?;

    tracing::info!(
        request_id = %request_id,
        user_id = ?user_id,
        limit = options.limit,
        excluded = options.exclude_item_ids.len(),
        "Processing recommendation request"
    );

    match state.engine.generate_recommendations(user_id, &options).await {
        Ok(items) => {
            tracing::info!(request_id = %request_id, count = items.len(), "Recommendations served");
            Ok(Json(items))
        }
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Recommendation pipeline failed");
            Ok(Json(vec![]))
        }
    }
}

/// Handler for cache invalidation after a follow or favorite change
pub async fn invalidate_recommendations(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(user_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    tracing::info!(request_id = %request_id, user_id = %user_id, "Invalidating recommendations");
    state.engine.invalidate_cache(user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
