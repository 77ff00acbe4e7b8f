//! yieldpilot-common: shared listing types and errors used across all YieldPilot crates.

pub mod entities;
pub mod error;

// Re-export commonly used types
pub use entities::{
    AdjustedMetrics, EnrichmentSnapshot, EpcRating, FloodRisk, KpiSnapshot, ListingMetrics,
    RankFactors, RankResult,
};
pub use error::{CommonError, Result};
