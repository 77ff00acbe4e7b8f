//! yieldpilot-web: HTTP surface for the deal ranker.
//!
//! Exposes the single-listing rank update, the batch recompute trigger, the
//! ranked-listing query and the regulation-adjusted metrics view over `axum`.

pub mod error;
pub mod handlers;
pub mod router;
pub mod state;

pub use error::ApiError;
pub use router::build_router;
pub use state::{AppState, SharedState};
