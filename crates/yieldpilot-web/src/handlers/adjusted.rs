//! Regulation-adjusted metrics, read straight from the precomputed view.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;
use yieldpilot_common::AdjustedMetrics;

use crate::error::ApiError;
use crate::state::SharedState;

#[derive(Debug, Deserialize)]
pub struct AdjustedQuery {
    pub limit: Option<usize>,
}

/// GET /api/adjusted-metrics/{id}
pub async fn api_adjusted_metrics(
    State(state): State<SharedState>,
    Path(listing_id): Path<Uuid>,
) -> Result<Json<AdjustedMetrics>, ApiError> {
    state
        .ranker
        .adjusted_metrics(listing_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("adjusted metrics for listing {listing_id}")))
}

/// GET /api/adjusted-metrics?limit=N
pub async fn api_list_adjusted_metrics(
    State(state): State<SharedState>,
    Query(q): Query<AdjustedQuery>,
) -> Result<Json<Vec<AdjustedMetrics>>, ApiError> {
    let limit = q.limit.unwrap_or(100);
    Ok(Json(state.ranker.list_adjusted_metrics(limit).await?))
}
