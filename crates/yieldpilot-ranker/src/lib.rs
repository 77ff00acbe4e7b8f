//! yieldpilot-ranker: deal ranking engine.
//! Weighted sub-score model over KPI and enrichment snapshots, plus the
//! batch and single-listing entry points that persist the results.

pub mod adjusted;
pub mod error;
pub mod listing;
pub mod recalculate;
pub mod scorer;
pub mod service;
pub mod weights;

pub use error::{RankerError, Result};
pub use recalculate::{recalculate_all, RecalcOptions, RecalcSummary};
pub use scorer::calculate_rank_score;
pub use service::RankerService;
pub use weights::{RankingWeights, WeightsProvider};
