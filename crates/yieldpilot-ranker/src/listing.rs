//! Single-listing rank update.

use chrono::Utc;
use tracing::{debug, instrument};
use uuid::Uuid;
use yieldpilot_common::{EnrichmentSnapshot, KpiSnapshot, RankResult};
use yieldpilot_db::MetricsRepository;

use crate::error::{RankerError, Result};
use crate::scorer::calculate_rank_score;
use crate::weights::WeightsProvider;

/// Score one listing with the current weights and write the result to its
/// metrics record.
///
/// Fails with `ListingNotFound` when no record exists for `listing_id` and
/// with `Storage` when the write is rejected. Never retries.
#[instrument(skip(repo, weights, kpis, enrichment))]
pub async fn rank_listing(
    repo: &dyn MetricsRepository,
    weights: &dyn WeightsProvider,
    listing_id: Uuid,
    kpis: &KpiSnapshot,
    enrichment: &EnrichmentSnapshot,
) -> Result<RankResult> {
    let w = weights.get_ranking_weights().await;
    let result = calculate_rank_score(kpis, &enrichment.with_default_epc(), &w);

    repo.update_rank(listing_id, result.score, &result.factors, Utc::now())
        .await
        .map_err(|e| RankerError::for_listing(listing_id, e))?;

    debug!(listing_id = %listing_id, score = result.score, "Listing ranked");
    Ok(result)
}

/// Rank a listing, taking any snapshot the caller leaves out from the
/// listing's stored record.
pub async fn rank_listing_with_overrides(
    repo: &dyn MetricsRepository,
    weights: &dyn WeightsProvider,
    listing_id: Uuid,
    kpis: Option<&KpiSnapshot>,
    enrichment: Option<&EnrichmentSnapshot>,
) -> Result<RankResult> {
    if let (Some(k), Some(e)) = (kpis, enrichment) {
        return rank_listing(repo, weights, listing_id, k, e).await;
    }

    let record = repo
        .find(listing_id)
        .await
        .map_err(|e| RankerError::for_listing(listing_id, e))?
        .ok_or(RankerError::ListingNotFound(listing_id))?;

    rank_listing(
        repo,
        weights,
        listing_id,
        kpis.unwrap_or(&record.kpis),
        enrichment.unwrap_or(&record.enrichment),
    )
    .await
}

/// Rescore a listing from the snapshots already stored on its record.
pub async fn rank_stored_listing(
    repo: &dyn MetricsRepository,
    weights: &dyn WeightsProvider,
    listing_id: Uuid,
) -> Result<RankResult> {
    rank_listing_with_overrides(repo, weights, listing_id, None, None).await
}
