//! Batch recompute of every persisted listing-metrics record.
//!
//! Walks the metrics table page by page (keyset cursor on `listing_id`),
//! rescoring each record and writing `rank_score`, `factors` and `updated_at`
//! back. Each write is an independent overwrite: a failure on one record is
//! logged and counted and the run moves on. There is no batch transaction, so
//! records written before a crash or host timeout stay written.

use std::time::Instant;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;
use yieldpilot_common::{ListingMetrics, RankResult};
use yieldpilot_config::RankerConfig;
use yieldpilot_db::{DbError, MetricsRepository};

use crate::scorer::calculate_rank_score;
use crate::weights::{RankingWeights, WeightsProvider};

/// Paging and fan-out settings for one batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecalcOptions {
    pub page_size: usize,
    /// Concurrent updates within a page; 1 runs sequentially.
    pub max_concurrency: usize,
}

impl Default for RecalcOptions {
    fn default() -> Self {
        Self { page_size: 500, max_concurrency: 1 }
    }
}

impl From<&RankerConfig> for RecalcOptions {
    fn from(cfg: &RankerConfig) -> Self {
        Self {
            page_size: cfg.page_size,
            max_concurrency: cfg.max_concurrency,
        }
    }
}

/// Outcome of one batch run.
///
/// Every record read lands in exactly one of `processed` (write succeeded) or
/// `errors` (write failed). A failed page read also counts once in `errors`
/// and in `page_errors`, and ends the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecalcSummary {
    pub run_id: Uuid,
    pub processed: u64,
    pub errors: u64,
    pub page_errors: u64,
    pub duration_ms: u64,
}

/// Score one record and persist the result. The caller-side EPC default ("E")
/// applies to records without a grade.
pub async fn rescore_record(
    repo: &dyn MetricsRepository,
    record: &ListingMetrics,
    weights: &RankingWeights,
) -> Result<RankResult, DbError> {
    let enrichment = record.enrichment.with_default_epc();
    let result = calculate_rank_score(&record.kpis, &enrichment, weights);
    repo.update_rank(record.listing_id, result.score, &result.factors, Utc::now())
        .await?;
    debug!(listing_id = %record.listing_id, score = result.score, "Listing rescored");
    Ok(result)
}

/// Rescore every record with `weights`.
#[instrument(skip(repo, weights, opts), fields(page_size = opts.page_size, concurrency = opts.max_concurrency))]
pub async fn recalculate_all(
    repo: &dyn MetricsRepository,
    weights: &RankingWeights,
    opts: &RecalcOptions,
) -> RecalcSummary {
    let run_id = Uuid::new_v4();
    let t0 = Instant::now();
    let page_size = opts.page_size.max(1);
    let concurrency = opts.max_concurrency.max(1);

    info!(run_id = %run_id, ?weights, "Starting rank recalculation");

    let mut summary = RecalcSummary {
        run_id,
        processed: 0,
        errors: 0,
        page_errors: 0,
        duration_ms: 0,
    };

    let mut cursor: Option<Uuid> = None;
    loop {
        let page = match repo.fetch_page(cursor, page_size).await {
            Ok(page) => page,
            Err(e) => {
                warn!(run_id = %run_id, cursor = ?cursor, error = %e, "Failed to read metrics page, stopping run");
                summary.errors += 1;
                summary.page_errors += 1;
                break;
            }
        };

        if page.is_empty() {
            break;
        }
        let last_page = page.len() < page_size;
        cursor = page.last().map(|m| m.listing_id);

        let outcomes: Vec<(Uuid, Result<RankResult, DbError>)> = stream::iter(page)
            .map(|record| async move {
                let outcome = rescore_record(repo, &record, weights).await;
                (record.listing_id, outcome)
            })
            .buffer_unordered(concurrency)
            .collect()
            .await;

        for (listing_id, outcome) in outcomes {
            match outcome {
                Ok(_) => summary.processed += 1,
                Err(e) => {
                    warn!(run_id = %run_id, listing_id = %listing_id, error = %e, "Failed to update listing rank");
                    summary.errors += 1;
                }
            }
        }

        if last_page {
            break;
        }
    }

    summary.duration_ms = t0.elapsed().as_millis() as u64;
    info!(
        run_id = %run_id,
        processed = summary.processed,
        errors = summary.errors,
        duration_ms = summary.duration_ms,
        "Rank recalculation finished"
    );
    summary
}

/// Read weights once from `provider`, then rescore every record.
/// The vector lives only for this run; the next run reads the flag again.
pub async fn recalculate_with_provider(
    repo: &dyn MetricsRepository,
    provider: &dyn WeightsProvider,
    opts: &RecalcOptions,
) -> RecalcSummary {
    let weights = provider.get_ranking_weights().await;
    recalculate_all(repo, &weights, opts).await
}
