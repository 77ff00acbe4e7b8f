//! Read-only access to the regulation-adjusted yield view.
//! Values are precomputed upstream; nothing here recalculates them.

use uuid::Uuid;
use yieldpilot_common::AdjustedMetrics;
use yieldpilot_db::AdjustedMetricsView;

use crate::error::Result;

/// Upper bound on rows returned by one list call.
pub const MAX_ADJUSTED_PAGE: usize = 500;

pub async fn get_adjusted_metrics(
    view: &dyn AdjustedMetricsView,
    listing_id: Uuid,
) -> Result<Option<AdjustedMetrics>> {
    Ok(view.get_adjusted(listing_id).await?)
}

pub async fn list_adjusted_metrics(
    view: &dyn AdjustedMetricsView,
    limit: usize,
) -> Result<Vec<AdjustedMetrics>> {
    Ok(view.list_adjusted(limit.min(MAX_ADJUSTED_PAGE)).await?)
}
