//! Deal rank score computation.
//!
//! Five sub-scores on a nominal 0–100 scale, combined as a weighted sum:
//!
//! total = yield·w_net_yield + dscr·w_dscr + cashflow·w_cashflow_pm + epc·w_epc + risk·w_risk
//!
//! Clamping follows each sub-score's rule exactly. The lower bound of
//! `dscr_score` and `yield_score` is left open and the total is never clamped,
//! so a listing with DSCR below 1.0 can rank below zero. Downstream sort order
//! relies on that range.

use yieldpilot_common::entities::finite_or_zero;
use yieldpilot_common::{EnrichmentSnapshot, EpcRating, FloodRisk, KpiSnapshot, RankFactors, RankResult};

use crate::weights::RankingWeights;

/// Net yield that scores 100.
pub const TARGET_NET_YIELD: f64 = 0.12;
/// DSCR that scores 0; break-even coverage.
pub const DSCR_FLOOR: f64 = 1.0;
/// DSCR span above the floor that scores 100 (1.5 total).
pub const DSCR_SPAN: f64 = 0.5;
/// Monthly cashflow that scores 100.
pub const TARGET_CASHFLOW_PM: f64 = 500.0;
/// EPC score when the grade is absent or unrecognised.
pub const EPC_FALLBACK_SCORE: f64 = 50.0;

pub const FLOOD_HIGH_PENALTY: f64 = 30.0;
pub const FLOOD_MEDIUM_PENALTY: f64 = 15.0;
pub const CRIME_THRESHOLD: f64 = 70.0;
pub const CRIME_PENALTY: f64 = 20.0;
pub const SHORT_LEASE_YEARS: i64 = 90;
pub const SHORT_LEASE_PENALTY: f64 = 25.0;
pub const STALE_LISTING_DAYS: i64 = 120;
pub const STALE_LISTING_PENALTY: f64 = 10.0;

pub fn yield_score(net_yield: f64) -> f64 {
    ((net_yield / TARGET_NET_YIELD) * 100.0).min(100.0)
}

/// Not clamped below: DSCR 0.5 scores -100, DSCR 0 scores -200.
pub fn dscr_score(dscr: f64) -> f64 {
    (((dscr - DSCR_FLOOR) / DSCR_SPAN) * 100.0).min(100.0)
}

pub fn cashflow_score(cashflow_pm: f64) -> f64 {
    ((cashflow_pm / TARGET_CASHFLOW_PM) * 100.0).clamp(0.0, 100.0)
}

pub fn epc_score(rating: Option<EpcRating>) -> f64 {
    match rating {
        Some(grade) => {
            let steps = (EpcRating::SCALE.len() - 1) as f64;
            grade.index() as f64 / steps * 100.0
        }
        None => EPC_FALLBACK_SCORE,
    }
}

/// Start at 100 and subtract each applicable penalty, floor 0.
/// A missing input applies no penalty.
pub fn risk_score(enrichment: &EnrichmentSnapshot) -> f64 {
    let mut score = 100.0;

    match enrichment.flood_risk {
        Some(FloodRisk::High) => score -= FLOOD_HIGH_PENALTY,
        Some(FloodRisk::Medium) => score -= FLOOD_MEDIUM_PENALTY,
        Some(FloodRisk::None) | None => {}
    }

    if enrichment.crime_score.is_some_and(|c| c > CRIME_THRESHOLD) {
        score -= CRIME_PENALTY;
    }

    if enrichment.lease_years.is_some_and(|y| y < SHORT_LEASE_YEARS) {
        score -= SHORT_LEASE_PENALTY;
    }

    if enrichment.days_on_market.is_some_and(|d| d > STALE_LISTING_DAYS) {
        score -= STALE_LISTING_PENALTY;
    }

    f64::max(score, 0.0)
}

/// Compute sub-scores and the weighted total.
///
/// Pure and total: missing or non-finite KPIs count as 0, an unknown EPC grade
/// scores the midpoint. Weights are used as given, with no sign or sum check,
/// except that a non-finite weight counts as 0. Any sub-score or total that
/// overflows to infinity is stored as 0, so every factor stays finite.
pub fn calculate_rank_score(
    kpis: &KpiSnapshot,
    enrichment: &EnrichmentSnapshot,
    weights: &RankingWeights,
) -> RankResult {
    let yield_s = finite_or_zero(Some(yield_score(kpis.net_yield_or_zero())));
    let dscr_s = finite_or_zero(Some(dscr_score(kpis.dscr_or_zero())));
    let cashflow_s = cashflow_score(kpis.cashflow_pm_or_zero());
    let epc_s = epc_score(enrichment.epc_rating);
    let risk_s = risk_score(enrichment);

    let w = |v: f64| finite_or_zero(Some(v));
    let total = finite_or_zero(Some(
        yield_s * w(weights.net_yield)
            + dscr_s * w(weights.dscr)
            + cashflow_s * w(weights.cashflow_pm)
            + epc_s * w(weights.epc)
            + risk_s * w(weights.risk),
    ));

    RankResult {
        score: total,
        factors: RankFactors {
            yield_score: yield_s,
            dscr_score: dscr_s,
            cashflow_score: cashflow_s,
            epc_score: epc_s,
            risk_score: risk_s,
            total,
        },
    }
}
