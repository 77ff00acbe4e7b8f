//! Weight vector for deal ranking and the providers that supply it.
//!
//! Weights live in the feature-flag store under `ranking_weights` so operators
//! can retune ranking without a redeploy. Any read problem falls back to the
//! built-in defaults; callers never see a configuration error.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;
use yieldpilot_db::FlagStore;

/// Flag-store key holding the weight vector JSON.
pub const RANKING_WEIGHTS_KEY: &str = "ranking_weights";

/// The 5-component weight vector.
/// Conventionally sums to 1.0; nothing enforces it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankingWeights {
    pub net_yield: f64,
    pub dscr: f64,
    pub cashflow_pm: f64,
    pub epc: f64,
    pub risk: f64,
}

impl Default for RankingWeights {
    fn default() -> Self {
        Self {
            net_yield:   0.35,
            dscr:        0.25,
            cashflow_pm: 0.20,
            epc:         0.10,
            risk:        0.10,
        }
    }
}

impl RankingWeights {
    pub fn sum(&self) -> f64 {
        self.as_array().iter().sum()
    }

    /// Whether the weights sum to ~1.0. Diagnostic only; scoring never
    /// renormalises.
    pub fn is_normalised(&self) -> bool {
        (self.sum() - 1.0).abs() < 1e-6
    }

    /// Order matches the sub-score order in `RankFactors`.
    pub fn as_array(&self) -> [f64; 5] {
        [self.net_yield, self.dscr, self.cashflow_pm, self.epc, self.risk]
    }

    /// Parse a flag value. `None` when the JSON does not describe a full
    /// weight vector.
    pub fn from_flag_value(value: serde_json::Value) -> Option<Self> {
        serde_json::from_value(value).ok()
    }
}

/// Source of the current weight vector.
#[async_trait]
pub trait WeightsProvider: Send + Sync {
    /// Never fails; implementations fall back to defaults.
    async fn get_ranking_weights(&self) -> RankingWeights;
}

// ── Flag-store provider ─────────────────────────────────────────────────────

/// Reads weights from a `FlagStore` on every call.
pub struct FlagWeightsProvider {
    store: Arc<dyn FlagStore>,
    key: String,
}

impl FlagWeightsProvider {
    pub fn new(store: Arc<dyn FlagStore>) -> Self {
        Self::with_key(store, RANKING_WEIGHTS_KEY)
    }

    pub fn with_key(store: Arc<dyn FlagStore>, key: impl Into<String>) -> Self {
        Self { store, key: key.into() }
    }
}

#[async_trait]
impl WeightsProvider for FlagWeightsProvider {
    async fn get_ranking_weights(&self) -> RankingWeights {
        match self.store.get_flag(&self.key).await {
            Ok(Some(value)) => RankingWeights::from_flag_value(value).unwrap_or_else(|| {
                warn!(key = %self.key, "Malformed ranking weights flag, using defaults");
                RankingWeights::default()
            }),
            Ok(None) => {
                tracing::debug!(key = %self.key, "Ranking weights flag not set, using defaults");
                RankingWeights::default()
            }
            Err(e) => {
                warn!(key = %self.key, error = %e, "Failed to read ranking weights, using defaults");
                RankingWeights::default()
            }
        }
    }
}

// ── Fixed provider ──────────────────────────────────────────────────────────

/// Always returns the same vector. Used in tests and for ad-hoc scoring.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticWeights(pub RankingWeights);

#[async_trait]
impl WeightsProvider for StaticWeights {
    async fn get_ranking_weights(&self) -> RankingWeights {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use yieldpilot_db::MemoryStore;
    use yieldpilot_test_utils::UnavailableFlagStore;

    #[test]
    fn test_default_weights_sum_to_one() {
        let w = RankingWeights::default();
        assert!(w.is_normalised(), "Default weights must sum to 1.0");
    }

    #[test]
    fn test_partial_flag_value_rejected() {
        let value = serde_json::json!({ "net_yield": 0.5, "dscr": 0.5 });
        assert!(RankingWeights::from_flag_value(value).is_none());
    }

    #[tokio::test]
    async fn test_reads_flag_value() {
        let store = MemoryStore::new().with_flag(
            RANKING_WEIGHTS_KEY,
            serde_json::json!({ "net_yield": 0.5, "dscr": 0.2, "cashflow_pm": 0.1, "epc": 0.1, "risk": 0.1 }),
        );
        let provider = FlagWeightsProvider::new(Arc::new(store));
        let w = provider.get_ranking_weights().await;
        assert_eq!(w.net_yield, 0.5);
        assert_eq!(w.dscr, 0.2);
    }

    #[tokio::test]
    async fn test_pathological_weights_passed_through() {
        let store = MemoryStore::new().with_flag(
            RANKING_WEIGHTS_KEY,
            serde_json::json!({ "net_yield": -1.0, "dscr": 3.0, "cashflow_pm": 0.0, "epc": 0.0, "risk": 0.0 }),
        );
        let provider = FlagWeightsProvider::new(Arc::new(store));
        let w = provider.get_ranking_weights().await;
        assert_eq!(w.net_yield, -1.0);
        assert!(!w.is_normalised());
    }

    #[tokio::test]
    async fn test_missing_flag_uses_defaults() {
        let provider = FlagWeightsProvider::new(Arc::new(MemoryStore::new()));
        assert_eq!(provider.get_ranking_weights().await, RankingWeights::default());
    }

    #[tokio::test]
    async fn test_malformed_flag_uses_defaults() {
        let store = MemoryStore::new()
            .with_flag(RANKING_WEIGHTS_KEY, serde_json::json!("not an object"));
        let provider = FlagWeightsProvider::new(Arc::new(store));
        assert_eq!(provider.get_ranking_weights().await, RankingWeights::default());
    }

    #[tokio::test]
    async fn test_store_error_uses_defaults() {
        let provider = FlagWeightsProvider::new(Arc::new(UnavailableFlagStore));
        assert_eq!(provider.get_ranking_weights().await, RankingWeights::default());
    }

    #[tokio::test]
    async fn test_custom_key() {
        let store = MemoryStore::new().with_flag(
            "ranking_weights_v2",
            serde_json::json!({ "net_yield": 0.2, "dscr": 0.2, "cashflow_pm": 0.2, "epc": 0.2, "risk": 0.2 }),
        );
        let provider = FlagWeightsProvider::with_key(Arc::new(store), "ranking_weights_v2");
        assert_eq!(provider.get_ranking_weights().await.epc, 0.2);
    }
}
