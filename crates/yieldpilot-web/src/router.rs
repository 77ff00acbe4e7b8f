//! Route table for the ranking API.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::handlers::{
    adjusted::{api_adjusted_metrics, api_list_adjusted_metrics},
    ranker::{api_rank_listing, api_recalculate, api_top_ranked, api_weights},
    system::health,
};
use crate::state::{AppState, SharedState};

/// Build and return the full Axum router.
pub fn build_router(state: AppState) -> Router {
    let shared: SharedState = Arc::new(state);

    Router::new()
        .route("/health", get(health))

        // Ranking
        .route("/api/ranker/listings/{id}", post(api_rank_listing))
        .route("/api/ranker/recalculate",   post(api_recalculate))
        .route("/api/ranker/weights",       get(api_weights))
        .route("/api/ranker/top",           get(api_top_ranked))

        // Regulation-adjusted metrics
        .route("/api/adjusted-metrics",      get(api_list_adjusted_metrics))
        .route("/api/adjusted-metrics/{id}", get(api_adjusted_metrics))

        // Middleware
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}
