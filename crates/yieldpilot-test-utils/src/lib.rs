//! Shared fixtures and fault-injecting stores for YieldPilot tests.

pub mod fixtures;
pub mod stores;

pub use fixtures::*;
pub use stores::{FlakyMetricsRepository, UnavailableFlagStore};

/// Assert two floats are equal within 1e-9.
#[track_caller]
pub fn assert_approx(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}
