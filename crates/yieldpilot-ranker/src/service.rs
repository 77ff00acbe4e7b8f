//! Ranker entry points bundled with their storage handles.
//!
//! The web layer holds one `RankerService` in its shared state. Weights are
//! read from the provider on every call; nothing is cached between requests.

use std::sync::Arc;

use uuid::Uuid;
use yieldpilot_common::{AdjustedMetrics, EnrichmentSnapshot, KpiSnapshot, ListingMetrics, RankResult};
use yieldpilot_config::RankerConfig;
use yieldpilot_db::{AdjustedMetricsView, FlagStore, MetricsRepository};

use crate::adjusted;
use crate::error::Result;
use crate::listing;
use crate::recalculate::{self, RecalcOptions, RecalcSummary};
use crate::weights::{FlagWeightsProvider, RankingWeights, WeightsProvider};

/// Upper bound on listings returned by `top_ranked`.
pub const MAX_TOP_RANKED: usize = 500;

#[derive(Clone)]
pub struct RankerService {
    metrics: Arc<dyn MetricsRepository>,
    adjusted: Arc<dyn AdjustedMetricsView>,
    weights: Arc<dyn WeightsProvider>,
    options: RecalcOptions,
}

impl RankerService {
    pub fn new(
        metrics: Arc<dyn MetricsRepository>,
        adjusted: Arc<dyn AdjustedMetricsView>,
        weights: Arc<dyn WeightsProvider>,
        options: RecalcOptions,
    ) -> Self {
        Self { metrics, adjusted, weights, options }
    }

    /// Wire every handle to one backend that implements all three stores.
    pub fn from_store<S>(store: Arc<S>, cfg: &RankerConfig) -> Self
    where
        S: FlagStore + MetricsRepository + AdjustedMetricsView + 'static,
    {
        let flags: Arc<dyn FlagStore> = store.clone();
        let weights = FlagWeightsProvider::with_key(flags, cfg.weights_flag_key.clone());
        Self::new(store.clone(), store, Arc::new(weights), RecalcOptions::from(cfg))
    }

    pub fn options(&self) -> &RecalcOptions {
        &self.options
    }

    pub async fn weights(&self) -> RankingWeights {
        self.weights.get_ranking_weights().await
    }

    pub async fn rank_listing(
        &self,
        listing_id: Uuid,
        kpis: &KpiSnapshot,
        enrichment: &EnrichmentSnapshot,
    ) -> Result<RankResult> {
        listing::rank_listing(self.metrics.as_ref(), self.weights.as_ref(), listing_id, kpis, enrichment).await
    }

    pub async fn rank_listing_with_overrides(
        &self,
        listing_id: Uuid,
        kpis: Option<&KpiSnapshot>,
        enrichment: Option<&EnrichmentSnapshot>,
    ) -> Result<RankResult> {
        listing::rank_listing_with_overrides(
            self.metrics.as_ref(),
            self.weights.as_ref(),
            listing_id,
            kpis,
            enrichment,
        )
        .await
    }

    pub async fn rank_stored_listing(&self, listing_id: Uuid) -> Result<RankResult> {
        listing::rank_stored_listing(self.metrics.as_ref(), self.weights.as_ref(), listing_id).await
    }

    /// Batch recompute with the weights current at the start of the run.
    pub async fn recalculate_all(&self) -> RecalcSummary {
        recalculate::recalculate_with_provider(self.metrics.as_ref(), self.weights.as_ref(), &self.options).await
    }

    pub async fn top_ranked(&self, limit: usize) -> Result<Vec<ListingMetrics>> {
        Ok(self.metrics.top_ranked(limit.min(MAX_TOP_RANKED)).await?)
    }

    pub async fn adjusted_metrics(&self, listing_id: Uuid) -> Result<Option<AdjustedMetrics>> {
        adjusted::get_adjusted_metrics(self.adjusted.as_ref(), listing_id).await
    }

    pub async fn list_adjusted_metrics(&self, limit: usize) -> Result<Vec<AdjustedMetrics>> {
        adjusted::list_adjusted_metrics(self.adjusted.as_ref(), limit).await
    }
}
