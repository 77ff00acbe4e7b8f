//! Listing snapshot and ranking result types.
//!
//! KPI and enrichment snapshots are produced upstream (finance calculator,
//! property enrichment) and are read-only inputs to the ranker. Every field is
//! optional; the defaulting rules live next to each accessor.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::CommonError;

// ── EPC rating ───────────────────────────────────────────────────────────────

/// Energy Performance Certificate grade, A (best) to G (worst).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EpcRating {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
}

impl EpcRating {
    /// Grades ordered worst to best. Position in this slice is the grade index.
    pub const SCALE: [EpcRating; 7] = [
        EpcRating::G,
        EpcRating::F,
        EpcRating::E,
        EpcRating::D,
        EpcRating::C,
        EpcRating::B,
        EpcRating::A,
    ];

    /// Grade callers substitute for an unknown rating before scoring.
    pub const DEFAULT_FOR_CALLERS: EpcRating = EpcRating::E;

    /// 0-based position on the G..A scale (G = 0, A = 6).
    pub fn index(self) -> usize {
        Self::SCALE.iter().position(|g| *g == self).unwrap_or(0)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EpcRating::A => "A",
            EpcRating::B => "B",
            EpcRating::C => "C",
            EpcRating::D => "D",
            EpcRating::E => "E",
            EpcRating::F => "F",
            EpcRating::G => "G",
        }
    }
}

impl FromStr for EpcRating {
    type Err = CommonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(EpcRating::A),
            "B" => Ok(EpcRating::B),
            "C" => Ok(EpcRating::C),
            "D" => Ok(EpcRating::D),
            "E" => Ok(EpcRating::E),
            "F" => Ok(EpcRating::F),
            "G" => Ok(EpcRating::G),
            _ => Err(CommonError::InvalidEpcRating(s.to_string())),
        }
    }
}

impl fmt::Display for EpcRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Flood risk ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FloodRisk {
    #[default]
    None,
    Medium,
    High,
}

impl FromStr for FloodRisk {
    type Err = CommonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(FloodRisk::None),
            "medium" => Ok(FloodRisk::Medium),
            "high" => Ok(FloodRisk::High),
            _ => Err(CommonError::InvalidFloodRisk(s.to_string())),
        }
    }
}

// Snapshot fields arrive as untyped JSON from upstream services. A field of
// the wrong type reads as absent instead of failing the whole snapshot.

/// Any string; unrecognised grades and non-strings become `None`.
fn lenient_epc<'de, D>(deserializer: D) -> Result<Option<EpcRating>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(raw.as_str().and_then(|s| s.parse().ok()))
}

/// Any string; unrecognised values and non-strings become `None` (no penalty).
fn lenient_flood<'de, D>(deserializer: D) -> Result<Option<FloodRisk>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(raw.as_str().and_then(|s| s.parse().ok()))
}

/// JSON numbers only; strings, booleans and objects become `None`.
fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(raw.as_f64())
}

/// Whole numbers of years or days. Fractions round down.
fn lenient_whole<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(match raw.as_i64() {
        Some(n) => Some(n),
        None => raw.as_f64().filter(|v| v.is_finite()).map(|v| v.floor() as i64),
    })
}

/// Missing and non-finite values coalesce to 0.
pub fn finite_or_zero(value: Option<f64>) -> f64 {
    match value {
        Some(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

// ── Snapshots ────────────────────────────────────────────────────────────────

/// Financial KPIs produced by the finance calculation step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KpiSnapshot {
    /// Annual net yield as a fraction (0.12 = 12%)
    #[serde(default, deserialize_with = "lenient_f64")]
    pub net_yield: Option<f64>,
    /// Debt-service coverage ratio
    #[serde(default, deserialize_with = "lenient_f64")]
    pub dscr: Option<f64>,
    /// Monthly cashflow in GBP
    #[serde(default, deserialize_with = "lenient_f64")]
    pub cashflow_pm: Option<f64>,
}

impl KpiSnapshot {
    /// Decode a stored JSON bag. Anything that is not an object reads as an
    /// empty snapshot.
    pub fn from_value(value: Value) -> Self {
        serde_json::from_value(value).unwrap_or_default()
    }

    pub fn net_yield_or_zero(&self) -> f64 {
        finite_or_zero(self.net_yield)
    }

    pub fn dscr_or_zero(&self) -> f64 {
        finite_or_zero(self.dscr)
    }

    pub fn cashflow_pm_or_zero(&self) -> f64 {
        finite_or_zero(self.cashflow_pm)
    }
}

/// Qualitative and risk attributes from the property enrichment service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentSnapshot {
    #[serde(default, deserialize_with = "lenient_epc")]
    pub epc_rating: Option<EpcRating>,
    #[serde(default, deserialize_with = "lenient_flood")]
    pub flood_risk: Option<FloodRisk>,
    /// 0–100, higher is worse
    #[serde(default, deserialize_with = "lenient_f64")]
    pub crime_score: Option<f64>,
    #[serde(default, deserialize_with = "lenient_whole")]
    pub lease_years: Option<i64>,
    #[serde(default, deserialize_with = "lenient_whole")]
    pub days_on_market: Option<i64>,
}

impl EnrichmentSnapshot {
    /// Decode a stored JSON bag. Anything that is not an object reads as an
    /// empty snapshot.
    pub fn from_value(value: Value) -> Self {
        serde_json::from_value(value).unwrap_or_default()
    }

    /// Copy with an unknown EPC rating replaced by the caller default ("E").
    pub fn with_default_epc(&self) -> Self {
        Self {
            epc_rating: Some(self.epc_rating.unwrap_or(EpcRating::DEFAULT_FOR_CALLERS)),
            ..self.clone()
        }
    }
}

// ── Ranking output ───────────────────────────────────────────────────────────

/// Sub-scores and weighted total for one listing.
///
/// Sub-scores are nominally 0–100 but only clamped where the formula says so;
/// `dscr_score` and `yield_score` can go negative and `total` is never clamped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankFactors {
    pub yield_score: f64,
    pub dscr_score: f64,
    pub cashflow_score: f64,
    pub epc_score: f64,
    pub risk_score: f64,
    pub total: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankResult {
    pub score: f64,
    pub factors: RankFactors,
}

/// Persisted per-listing metrics record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingMetrics {
    pub listing_id: Uuid,
    #[serde(default)]
    pub kpis: KpiSnapshot,
    #[serde(default)]
    pub enrichment: EnrichmentSnapshot,
    pub rank_score: Option<f64>,
    pub factors: Option<RankFactors>,
    pub updated_at: DateTime<Utc>,
}

impl ListingMetrics {
    pub fn new(listing_id: Uuid, kpis: KpiSnapshot, enrichment: EnrichmentSnapshot) -> Self {
        Self {
            listing_id,
            kpis,
            enrichment,
            rank_score: None,
            factors: None,
            updated_at: Utc::now(),
        }
    }

    /// Overwrite score, factors and timestamp wholesale.
    pub fn apply_rank(&mut self, result: &RankResult, at: DateTime<Utc>) {
        self.rank_score = Some(result.score);
        self.factors = Some(result.factors);
        self.updated_at = at;
    }
}

/// Row of the precomputed regulation-adjusted yield view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjustedMetrics {
    pub listing_id: Uuid,
    pub net_yield: Option<f64>,
    pub adjusted_net_yield: Option<f64>,
    /// Annualised cost of regulatory compliance (licensing, EPC works)
    pub regulation_cost_annual: Option<f64>,
    pub epc_rating: Option<EpcRating>,
    pub epc_upgrade_cost: Option<f64>,
    pub epc_target_rating: Option<EpcRating>,
    pub computed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_epc_scale_positions() {
        assert_eq!(EpcRating::G.index(), 0);
        assert_eq!(EpcRating::D.index(), 3);
        assert_eq!(EpcRating::A.index(), 6);
    }

    #[test]
    fn test_epc_parse_is_case_insensitive() {
        assert_eq!(" b ".parse::<EpcRating>().unwrap(), EpcRating::B);
        assert_eq!("g".parse::<EpcRating>().unwrap(), EpcRating::G);
        assert!("H".parse::<EpcRating>().is_err());
        assert!("".parse::<EpcRating>().is_err());
    }

    #[test]
    fn test_enrichment_unknown_values_become_none() {
        let json = r#"{"epc_rating":"Z","flood_risk":"severe","crime_score":12.0}"#;
        let e: EnrichmentSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(e.epc_rating, None);
        assert_eq!(e.flood_risk, None);
        assert_eq!(e.crime_score, Some(12.0));
    }

    #[test]
    fn test_enrichment_parses_known_values() {
        let json = r#"{"epc_rating":"c","flood_risk":"High","lease_years":85}"#;
        let e: EnrichmentSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(e.epc_rating, Some(EpcRating::C));
        assert_eq!(e.flood_risk, Some(FloodRisk::High));
        assert_eq!(e.lease_years, Some(85));
        assert_eq!(e.days_on_market, None);
    }

    #[test]
    fn test_kpi_wrong_types_read_as_missing() {
        let k: KpiSnapshot =
            serde_json::from_str(r#"{"net_yield":"0.08","dscr":1.3,"cashflow_pm":true}"#).unwrap();
        assert_eq!(k.net_yield, None);
        assert_eq!(k.dscr, Some(1.3));
        assert_eq!(k.cashflow_pm, None);
        assert_eq!(k.net_yield_or_zero(), 0.0);
    }

    #[test]
    fn test_enrichment_wrong_types_read_as_missing() {
        let json = r#"{"epc_rating":3,"flood_risk":["high"],"crime_score":"80","lease_years":99.5,"days_on_market":"long"}"#;
        let e: EnrichmentSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(e.epc_rating, None);
        assert_eq!(e.flood_risk, None);
        assert_eq!(e.crime_score, None);
        assert_eq!(e.lease_years, Some(99));
        assert_eq!(e.days_on_market, None);
    }

    #[test]
    fn test_fractional_lease_rounds_down() {
        let e: EnrichmentSnapshot = serde_json::from_str(r#"{"lease_years":89.9,"days_on_market":-0.5}"#).unwrap();
        assert_eq!(e.lease_years, Some(89));
        assert_eq!(e.days_on_market, Some(-1));
    }

    #[test]
    fn test_non_object_snapshot_reads_as_empty() {
        assert_eq!(KpiSnapshot::from_value(serde_json::json!("n/a")), KpiSnapshot::default());
        assert_eq!(EnrichmentSnapshot::from_value(serde_json::json!(42)), EnrichmentSnapshot::default());
        assert_eq!(
            EnrichmentSnapshot::from_value(serde_json::json!({ "epc_rating": "b" })).epc_rating,
            Some(EpcRating::B)
        );
    }

    #[test]
    fn test_kpi_coalescing() {
        let k = KpiSnapshot { net_yield: Some(f64::NAN), dscr: None, cashflow_pm: Some(250.0) };
        assert_eq!(k.net_yield_or_zero(), 0.0);
        assert_eq!(k.dscr_or_zero(), 0.0);
        assert_eq!(k.cashflow_pm_or_zero(), 250.0);
        assert_eq!(finite_or_zero(Some(f64::INFINITY)), 0.0);
    }

    #[test]
    fn test_with_default_epc_only_fills_missing() {
        let missing = EnrichmentSnapshot::default();
        assert_eq!(missing.with_default_epc().epc_rating, Some(EpcRating::E));

        let known = EnrichmentSnapshot { epc_rating: Some(EpcRating::B), ..Default::default() };
        assert_eq!(known.with_default_epc().epc_rating, Some(EpcRating::B));
    }

    #[test]
    fn test_apply_rank_overwrites() {
        let mut m = ListingMetrics::new(Uuid::new_v4(), KpiSnapshot::default(), EnrichmentSnapshot::default());
        let factors = RankFactors {
            yield_score: 1.0, dscr_score: 2.0, cashflow_score: 3.0,
            epc_score: 4.0, risk_score: 5.0, total: 6.0,
        };
        let at = Utc::now();
        m.apply_rank(&RankResult { score: 6.0, factors }, at);
        assert_eq!(m.rank_score, Some(6.0));
        assert_eq!(m.factors, Some(factors));
        assert_eq!(m.updated_at, at);
    }
}
