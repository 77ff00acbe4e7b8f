//! In-process store implementing every storage trait.
//!
//! Records live in a `BTreeMap` keyed by listing id so page order matches the
//! Postgres backend's `ORDER BY listing_id`.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;
use yieldpilot_common::{AdjustedMetrics, ListingMetrics, RankFactors};

use crate::error::{DbError, Result};
use crate::store::{AdjustedMetricsView, FlagStore, MetricsRepository};

#[derive(Default)]
pub struct MemoryStore {
    flags: RwLock<HashMap<String, serde_json::Value>>,
    metrics: RwLock<BTreeMap<Uuid, ListingMetrics>>,
    adjusted: RwLock<BTreeMap<Uuid, AdjustedMetrics>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record (builder style, for tests and local runs).
    pub fn with_listing(mut self, metrics: ListingMetrics) -> Self {
        self.metrics.get_mut().insert(metrics.listing_id, metrics);
        self
    }

    pub fn with_flag(mut self, key: &str, value: serde_json::Value) -> Self {
        self.flags.get_mut().insert(key.to_string(), value);
        self
    }

    pub fn with_adjusted(mut self, row: AdjustedMetrics) -> Self {
        self.adjusted.get_mut().insert(row.listing_id, row);
        self
    }

    pub async fn insert_adjusted(&self, row: AdjustedMetrics) {
        self.adjusted.write().await.insert(row.listing_id, row);
    }
}

/// Descending by score, unscored last, ties by listing id.
fn rank_order(a: &ListingMetrics, b: &ListingMetrics) -> Ordering {
    match (a.rank_score, b.rank_score) {
        (Some(x), Some(y)) => y.total_cmp(&x).then(a.listing_id.cmp(&b.listing_id)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.listing_id.cmp(&b.listing_id),
    }
}

#[async_trait]
impl FlagStore for MemoryStore {
    async fn get_flag(&self, key: &str) -> Result<Option<serde_json::Value>> {
        Ok(self.flags.read().await.get(key).cloned())
    }

    async fn set_flag(&self, key: &str, value: serde_json::Value) -> Result<()> {
        self.flags.write().await.insert(key.to_string(), value);
        Ok(())
    }
}

#[async_trait]
impl MetricsRepository for MemoryStore {
    async fn fetch_page(&self, after: Option<Uuid>, limit: usize) -> Result<Vec<ListingMetrics>> {
        let metrics = self.metrics.read().await;
        let page = match after {
            Some(cursor) => metrics
                .range((std::ops::Bound::Excluded(cursor), std::ops::Bound::Unbounded))
                .take(limit)
                .map(|(_, m)| m.clone())
                .collect(),
            None => metrics.values().take(limit).cloned().collect(),
        };
        Ok(page)
    }

    async fn find(&self, listing_id: Uuid) -> Result<Option<ListingMetrics>> {
        Ok(self.metrics.read().await.get(&listing_id).cloned())
    }

    async fn update_rank(
        &self,
        listing_id: Uuid,
        rank_score: f64,
        factors: &RankFactors,
        updated_at: DateTime<Utc>,
    ) -> Result<()> {
        let mut metrics = self.metrics.write().await;
        let record = metrics
            .get_mut(&listing_id)
            .ok_or_else(|| DbError::NotFound(listing_id.to_string()))?;
        record.rank_score = Some(rank_score);
        record.factors = Some(*factors);
        record.updated_at = updated_at;
        Ok(())
    }

    async fn upsert(&self, metrics: &ListingMetrics) -> Result<()> {
        self.metrics.write().await.insert(metrics.listing_id, metrics.clone());
        Ok(())
    }

    async fn top_ranked(&self, limit: usize) -> Result<Vec<ListingMetrics>> {
        let mut all: Vec<ListingMetrics> = self.metrics.read().await.values().cloned().collect();
        all.sort_by(rank_order);
        all.truncate(limit);
        Ok(all)
    }
}

#[async_trait]
impl AdjustedMetricsView for MemoryStore {
    async fn get_adjusted(&self, listing_id: Uuid) -> Result<Option<AdjustedMetrics>> {
        Ok(self.adjusted.read().await.get(&listing_id).cloned())
    }

    async fn list_adjusted(&self, limit: usize) -> Result<Vec<AdjustedMetrics>> {
        Ok(self.adjusted.read().await.values().take(limit).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use yieldpilot_common::{EnrichmentSnapshot, KpiSnapshot};

    fn listing(id: u128, score: Option<f64>) -> ListingMetrics {
        let mut m = ListingMetrics::new(
            Uuid::from_u128(id),
            KpiSnapshot::default(),
            EnrichmentSnapshot::default(),
        );
        m.rank_score = score;
        m
    }

    fn factors(total: f64) -> RankFactors {
        RankFactors {
            yield_score: 0.0, dscr_score: 0.0, cashflow_score: 0.0,
            epc_score: 0.0, risk_score: 0.0, total,
        }
    }

    #[tokio::test]
    async fn test_pages_walk_every_record_once() {
        let store = (1..=5).fold(MemoryStore::new(), |s, i| s.with_listing(listing(i, None)));

        let first = store.fetch_page(None, 2).await.unwrap();
        let second = store.fetch_page(Some(first[1].listing_id), 2).await.unwrap();
        let third = store.fetch_page(Some(second[1].listing_id), 2).await.unwrap();
        let fourth = store.fetch_page(Some(third[0].listing_id), 2).await.unwrap();

        let ids: Vec<u128> = first.iter().chain(&second).chain(&third)
            .map(|m| m.listing_id.as_u128())
            .collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
        assert!(fourth.is_empty());
    }

    #[tokio::test]
    async fn test_update_rank_missing_record() {
        let store = MemoryStore::new();
        let err = store
            .update_rank(Uuid::from_u128(9), 10.0, &factors(10.0), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_rank_overwrites() {
        let store = MemoryStore::new().with_listing(listing(1, Some(3.0)));
        let at = Utc::now();
        store.update_rank(Uuid::from_u128(1), 42.0, &factors(42.0), at).await.unwrap();

        let stored = store.find(Uuid::from_u128(1)).await.unwrap().unwrap();
        assert_eq!(stored.rank_score, Some(42.0));
        assert_eq!(stored.factors, Some(factors(42.0)));
        assert_eq!(stored.updated_at, at);
    }

    #[tokio::test]
    async fn test_top_ranked_order() {
        let store = MemoryStore::new()
            .with_listing(listing(1, Some(10.0)))
            .with_listing(listing(2, None))
            .with_listing(listing(3, Some(-35.0)))
            .with_listing(listing(4, Some(90.0)));

        let top = store.top_ranked(10).await.unwrap();
        let ids: Vec<u128> = top.iter().map(|m| m.listing_id.as_u128()).collect();
        assert_eq!(ids, vec![4, 1, 3, 2]);

        assert_eq!(store.top_ranked(2).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_flags_roundtrip() {
        let store = MemoryStore::new();
        assert!(store.get_flag("ranking_weights").await.unwrap().is_none());
        store.set_flag("ranking_weights", serde_json::json!({"dscr": 1.0})).await.unwrap();
        assert_eq!(
            store.get_flag("ranking_weights").await.unwrap(),
            Some(serde_json::json!({"dscr": 1.0}))
        );
    }
}
