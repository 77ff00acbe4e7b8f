//! PostgreSQL (Supabase) implementation of the storage traits.
//!
//! Rank writes are wholesale overwrites of `rank_score`, `factors` and
//! `updated_at`; there is no history table and no row locking.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;
use yieldpilot_common::{
    AdjustedMetrics, EnrichmentSnapshot, KpiSnapshot, ListingMetrics, RankFactors,
};

use crate::error::{DbError, Result};
use crate::store::{AdjustedMetricsView, FlagStore, MetricsRepository};

/// Tables owned by this crate. The adjusted-metrics view is maintained upstream.
pub const SCHEMA_SQL: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS feature_flags (
        key   TEXT PRIMARY KEY,
        value JSONB NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS listing_metrics (
        listing_id UUID PRIMARY KEY,
        kpis       JSONB,
        enrichment JSONB,
        rank_score DOUBLE PRECISION,
        factors    JSONB,
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
];

/// PostgreSQL-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self { Self { pool } }

    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool { &self.pool }

    /// Create the flag and metrics tables if they do not exist.
    pub async fn ensure_schema(&self) -> Result<()> {
        for statement in SCHEMA_SQL {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        tracing::debug!(tables = SCHEMA_SQL.len(), "Schema ensured");
        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct ListingMetricsRow {
    listing_id: Uuid,
    kpis: Option<Json<serde_json::Value>>,
    enrichment: Option<Json<serde_json::Value>>,
    rank_score: Option<f64>,
    factors: Option<Json<serde_json::Value>>,
    updated_at: DateTime<Utc>,
}

impl From<ListingMetricsRow> for ListingMetrics {
    fn from(r: ListingMetricsRow) -> Self {
        Self {
            listing_id: r.listing_id,
            kpis: r.kpis.map(|j| KpiSnapshot::from_value(j.0)).unwrap_or_default(),
            enrichment: r
                .enrichment
                .map(|j| EnrichmentSnapshot::from_value(j.0))
                .unwrap_or_default(),
            rank_score: r.rank_score,
            // Unreadable factors are recomputed on the next pass.
            factors: r.factors.and_then(|j| serde_json::from_value(j.0).ok()),
            updated_at: r.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct AdjustedMetricsRow {
    listing_id: Uuid,
    net_yield: Option<f64>,
    adjusted_net_yield: Option<f64>,
    regulation_cost_annual: Option<f64>,
    epc_rating: Option<String>,
    epc_upgrade_cost: Option<f64>,
    epc_target_rating: Option<String>,
    computed_at: DateTime<Utc>,
}

impl From<AdjustedMetricsRow> for AdjustedMetrics {
    fn from(r: AdjustedMetricsRow) -> Self {
        Self {
            listing_id: r.listing_id,
            net_yield: r.net_yield,
            adjusted_net_yield: r.adjusted_net_yield,
            regulation_cost_annual: r.regulation_cost_annual,
            epc_rating: r.epc_rating.and_then(|s| s.parse().ok()),
            epc_upgrade_cost: r.epc_upgrade_cost,
            epc_target_rating: r.epc_target_rating.and_then(|s| s.parse().ok()),
            computed_at: r.computed_at,
        }
    }
}

const METRICS_COLUMNS: &str =
    "listing_id, kpis, enrichment, rank_score, factors, updated_at";

const ADJUSTED_COLUMNS: &str =
    "listing_id, net_yield, adjusted_net_yield, regulation_cost_annual, \
     epc_rating, epc_upgrade_cost, epc_target_rating, computed_at";

#[async_trait]
impl FlagStore for PgStore {
    async fn get_flag(&self, key: &str) -> Result<Option<serde_json::Value>> {
        let value = sqlx::query_scalar::<_, serde_json::Value>(
            "SELECT value FROM feature_flags WHERE key = $1",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;
        Ok(value)
    }

    async fn set_flag(&self, key: &str, value: serde_json::Value) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO feature_flags (key, value) VALUES ($1, $2)
            ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl MetricsRepository for PgStore {
    async fn fetch_page(&self, after: Option<Uuid>, limit: usize) -> Result<Vec<ListingMetrics>> {
        let sql = format!(
            "SELECT {METRICS_COLUMNS} FROM listing_metrics \
             WHERE ($1::uuid IS NULL OR listing_id > $1) \
             ORDER BY listing_id \
             LIMIT $2"
        );
        let rows = sqlx::query_as::<_, ListingMetricsRow>(&sql)
            .bind(after)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(ListingMetrics::from).collect())
    }

    async fn find(&self, listing_id: Uuid) -> Result<Option<ListingMetrics>> {
        let sql = format!("SELECT {METRICS_COLUMNS} FROM listing_metrics WHERE listing_id = $1");
        let row = sqlx::query_as::<_, ListingMetricsRow>(&sql)
            .bind(listing_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(ListingMetrics::from))
    }

    async fn update_rank(
        &self,
        listing_id: Uuid,
        rank_score: f64,
        factors: &RankFactors,
        updated_at: DateTime<Utc>,
    ) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE listing_metrics
               SET rank_score = $2, factors = $3, updated_at = $4
             WHERE listing_id = $1
            "#,
        )
        .bind(listing_id)
        .bind(rank_score)
        .bind(Json(factors))
        .bind(updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(listing_id.to_string()));
        }
        Ok(())
    }

    async fn upsert(&self, metrics: &ListingMetrics) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO listing_metrics
                (listing_id, kpis, enrichment, rank_score, factors, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (listing_id) DO UPDATE SET
                kpis       = EXCLUDED.kpis,
                enrichment = EXCLUDED.enrichment,
                rank_score = EXCLUDED.rank_score,
                factors    = EXCLUDED.factors,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(metrics.listing_id)
        .bind(Json(&metrics.kpis))
        .bind(Json(&metrics.enrichment))
        .bind(metrics.rank_score)
        .bind(metrics.factors.as_ref().map(Json))
        .bind(metrics.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn top_ranked(&self, limit: usize) -> Result<Vec<ListingMetrics>> {
        let sql = format!(
            "SELECT {METRICS_COLUMNS} FROM listing_metrics \
             ORDER BY rank_score DESC NULLS LAST, listing_id \
             LIMIT $1"
        );
        let rows = sqlx::query_as::<_, ListingMetricsRow>(&sql)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(ListingMetrics::from).collect())
    }
}

#[async_trait]
impl AdjustedMetricsView for PgStore {
    async fn get_adjusted(&self, listing_id: Uuid) -> Result<Option<AdjustedMetrics>> {
        let sql = format!(
            "SELECT {ADJUSTED_COLUMNS} FROM listing_adjusted_metrics WHERE listing_id = $1"
        );
        let row = sqlx::query_as::<_, AdjustedMetricsRow>(&sql)
            .bind(listing_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(AdjustedMetrics::from))
    }

    async fn list_adjusted(&self, limit: usize) -> Result<Vec<AdjustedMetrics>> {
        let sql = format!(
            "SELECT {ADJUSTED_COLUMNS} FROM listing_adjusted_metrics \
             ORDER BY listing_id LIMIT $1"
        );
        let rows = sqlx::query_as::<_, AdjustedMetricsRow>(&sql)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(AdjustedMetrics::from).collect())
    }
}
