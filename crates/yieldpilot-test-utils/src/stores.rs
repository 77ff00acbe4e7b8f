//! Stores that fail on demand.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;
use yieldpilot_common::{ListingMetrics, RankFactors};
use yieldpilot_db::{DbError, FlagStore, MemoryStore, MetricsRepository, Result};

/// Flag store whose every call fails.
pub struct UnavailableFlagStore;

#[async_trait]
impl FlagStore for UnavailableFlagStore {
    async fn get_flag(&self, key: &str) -> Result<Option<serde_json::Value>> {
        Err(DbError::Unavailable(format!("flag store offline (key {key})")))
    }

    async fn set_flag(&self, key: &str, _value: serde_json::Value) -> Result<()> {
        Err(DbError::Unavailable(format!("flag store offline (key {key})")))
    }
}

/// Wraps a `MemoryStore`, rejecting writes for chosen listings and
/// optionally failing page reads after a number of successful pages.
pub struct FlakyMetricsRepository {
    inner: MemoryStore,
    reject_writes: HashSet<Uuid>,
    fail_page_after: Option<usize>,
    pages_served: AtomicUsize,
}

impl FlakyMetricsRepository {
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            reject_writes: HashSet::new(),
            fail_page_after: None,
            pages_served: AtomicUsize::new(0),
        }
    }

    pub fn reject_writes_for(mut self, ids: impl IntoIterator<Item = Uuid>) -> Self {
        self.reject_writes.extend(ids);
        self
    }

    /// Serve `pages` pages successfully, then fail every read.
    pub fn fail_page_reads_after(mut self, pages: usize) -> Self {
        self.fail_page_after = Some(pages);
        self
    }

    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }
}

#[async_trait]
impl MetricsRepository for FlakyMetricsRepository {
    async fn fetch_page(&self, after: Option<Uuid>, limit: usize) -> Result<Vec<ListingMetrics>> {
        let served = self.pages_served.fetch_add(1, Ordering::SeqCst);
        if self.fail_page_after.is_some_and(|n| served >= n) {
            return Err(DbError::Unavailable("metrics table read timed out".into()));
        }
        self.inner.fetch_page(after, limit).await
    }

    async fn find(&self, listing_id: Uuid) -> Result<Option<ListingMetrics>> {
        self.inner.find(listing_id).await
    }

    async fn update_rank(
        &self,
        listing_id: Uuid,
        rank_score: f64,
        factors: &RankFactors,
        updated_at: DateTime<Utc>,
    ) -> Result<()> {
        if self.reject_writes.contains(&listing_id) {
            return Err(DbError::WriteRejected(listing_id.to_string()));
        }
        self.inner.update_rank(listing_id, rank_score, factors, updated_at).await
    }

    async fn upsert(&self, metrics: &ListingMetrics) -> Result<()> {
        self.inner.upsert(metrics).await
    }

    async fn top_ranked(&self, limit: usize) -> Result<Vec<ListingMetrics>> {
        self.inner.top_ranked(limit).await
    }
}
