//! Deal ranking API: single-listing updates, batch recompute, ranked reads.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use yieldpilot_common::{EnrichmentSnapshot, KpiSnapshot, ListingMetrics, RankResult};
use yieldpilot_ranker::{RankingWeights, RecalcSummary};

use crate::error::ApiError;
use crate::state::SharedState;

pub const DEFAULT_TOP_LIMIT: usize = 50;

/// Snapshots to score with. A missing snapshot is taken from the stored record.
#[derive(Debug, Default, Deserialize)]
pub struct RankRequest {
    #[serde(default)]
    pub kpis: Option<KpiSnapshot>,
    #[serde(default)]
    pub enrichment: Option<EnrichmentSnapshot>,
}

impl RankRequest {
    /// An empty body rescores from the stored record.
    pub fn from_body(body: &[u8]) -> Result<Self, ApiError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body).map_err(|e| ApiError::BadRequest(format!("invalid rank request: {e}")))
    }
}

#[derive(Debug, Serialize)]
pub struct WeightsResponse {
    pub weights: RankingWeights,
    pub sum: f64,
    pub normalised: bool,
}

#[derive(Debug, Deserialize)]
pub struct TopQuery {
    pub limit: Option<usize>,
}

/// POST /api/ranker/listings/{id}
pub async fn api_rank_listing(
    State(state): State<SharedState>,
    Path(listing_id): Path<Uuid>,
    body: Bytes,
) -> Result<Json<RankResult>, ApiError> {
    let req = RankRequest::from_body(&body)?;
    let result = state
        .ranker
        .rank_listing_with_overrides(listing_id, req.kpis.as_ref(), req.enrichment.as_ref())
        .await?;
    info!(listing_id = %listing_id, score = result.score, "Listing ranked");
    Ok(Json(result))
}

/// POST /api/ranker/recalculate
pub async fn api_recalculate(State(state): State<SharedState>) -> Json<RecalcSummary> {
    Json(state.ranker.recalculate_all().await)
}

/// GET /api/ranker/weights
pub async fn api_weights(State(state): State<SharedState>) -> Json<WeightsResponse> {
    let weights = state.ranker.weights().await;
    Json(WeightsResponse {
        sum: weights.sum(),
        normalised: weights.is_normalised(),
        weights,
    })
}

/// GET /api/ranker/top?limit=N
pub async fn api_top_ranked(
    State(state): State<SharedState>,
    Query(q): Query<TopQuery>,
) -> Result<Json<Vec<ListingMetrics>>, ApiError> {
    let limit = q.limit.unwrap_or(DEFAULT_TOP_LIMIT);
    Ok(Json(state.ranker.top_ranked(limit).await?))
}
