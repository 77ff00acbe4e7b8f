//! Storage traits used by the ranker.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;
use yieldpilot_common::{AdjustedMetrics, ListingMetrics, RankFactors};

use crate::error::Result;

/// Generic key/value feature-flag store.
#[async_trait]
pub trait FlagStore: Send + Sync {
    /// Raw JSON value for `key`, or `None` if the flag is not set.
    async fn get_flag(&self, key: &str) -> Result<Option<serde_json::Value>>;

    /// Insert or replace a flag value.
    async fn set_flag(&self, key: &str, value: serde_json::Value) -> Result<()>;
}

/// Listing metrics records.
#[async_trait]
pub trait MetricsRepository: Send + Sync {
    /// Up to `limit` records ordered by `listing_id`, strictly after `after`.
    async fn fetch_page(&self, after: Option<Uuid>, limit: usize) -> Result<Vec<ListingMetrics>>;

    async fn find(&self, listing_id: Uuid) -> Result<Option<ListingMetrics>>;

    /// Overwrite `rank_score`, `factors` and `updated_at` on one record.
    /// Fails with `DbError::NotFound` if the record does not exist.
    async fn update_rank(
        &self,
        listing_id: Uuid,
        rank_score: f64,
        factors: &RankFactors,
        updated_at: DateTime<Utc>,
    ) -> Result<()>;

    /// Insert or replace a whole record.
    async fn upsert(&self, metrics: &ListingMetrics) -> Result<()>;

    /// Records ordered by `rank_score` descending, unscored records last.
    async fn top_ranked(&self, limit: usize) -> Result<Vec<ListingMetrics>>;
}

/// Read-only regulation-adjusted yield view.
#[async_trait]
pub trait AdjustedMetricsView: Send + Sync {
    async fn get_adjusted(&self, listing_id: Uuid) -> Result<Option<AdjustedMetrics>>;

    async fn list_adjusted(&self, limit: usize) -> Result<Vec<AdjustedMetrics>>;
}
