//! Listing builders.

use chrono::Utc;
use uuid::Uuid;
use yieldpilot_common::{
    AdjustedMetrics, EnrichmentSnapshot, EpcRating, FloodRisk, KpiSnapshot, ListingMetrics,
};
use yieldpilot_db::MemoryStore;

/// KPIs that max every financial sub-score.
pub fn ideal_kpis() -> KpiSnapshot {
    KpiSnapshot {
        net_yield: Some(0.12),
        dscr: Some(1.5),
        cashflow_pm: Some(500.0),
    }
}

/// Enrichment with EPC A and no risk penalties.
pub fn ideal_enrichment() -> EnrichmentSnapshot {
    EnrichmentSnapshot {
        epc_rating: Some(EpcRating::A),
        flood_risk: Some(FloodRisk::None),
        ..Default::default()
    }
}

/// Enrichment that triggers every risk penalty.
pub fn risky_enrichment() -> EnrichmentSnapshot {
    EnrichmentSnapshot {
        epc_rating: Some(EpcRating::G),
        flood_risk: Some(FloodRisk::High),
        crime_score: Some(80.0),
        lease_years: Some(60),
        days_on_market: Some(200),
    }
}

/// Deterministic listing id.
pub fn listing_id(n: u128) -> Uuid {
    Uuid::from_u128(n)
}

pub fn listing(n: u128, kpis: KpiSnapshot, enrichment: EnrichmentSnapshot) -> ListingMetrics {
    ListingMetrics::new(listing_id(n), kpis, enrichment)
}

/// Store seeded with listings 1..=count, all with ideal inputs.
pub fn seeded_store(count: u128) -> MemoryStore {
    (1..=count).fold(MemoryStore::new(), |store, n| {
        store.with_listing(listing(n, ideal_kpis(), ideal_enrichment()))
    })
}

pub fn adjusted_row(n: u128) -> AdjustedMetrics {
    AdjustedMetrics {
        listing_id: listing_id(n),
        net_yield: Some(0.072),
        adjusted_net_yield: Some(0.064),
        regulation_cost_annual: Some(720.0),
        epc_rating: Some(EpcRating::E),
        epc_upgrade_cost: Some(8_500.0),
        epc_target_rating: Some(EpcRating::C),
        computed_at: Utc::now(),
    }
}

/// Ranking weights flag JSON.
pub fn weights_json(net_yield: f64, dscr: f64, cashflow_pm: f64, epc: f64, risk: f64) -> serde_json::Value {
    serde_json::json!({
        "net_yield": net_yield,
        "dscr": dscr,
        "cashflow_pm": cashflow_pm,
        "epc": epc,
        "risk": risk,
    })
}
