//! Router-level tests driven through `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tower::ServiceExt;
use yieldpilot_common::{EnrichmentSnapshot, KpiSnapshot};
use yieldpilot_config::RankerConfig;
use yieldpilot_db::{MemoryStore, MetricsRepository};
use yieldpilot_ranker::RankerService;
use yieldpilot_test_utils::{
    adjusted_row, assert_approx, ideal_enrichment, ideal_kpis, listing, listing_id, risky_enrichment,
    weights_json,
};
use yieldpilot_web::{build_router, AppState};

fn app(store: Arc<MemoryStore>) -> Router {
    build_router(AppState::new(RankerService::from_store(store, &RankerConfig::default())))
}

async fn send(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(v) => builder
            .header("content-type", "application/json")
            .body(Body::from(v.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, json)
}

#[tokio::test]
async fn test_health() {
    let (status, body) = send(app(Arc::new(MemoryStore::new())), "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_rank_listing_with_body() {
    let store = Arc::new(
        MemoryStore::new().with_listing(listing(1, KpiSnapshot::default(), EnrichmentSnapshot::default())),
    );
    let body = json!({
        "kpis": { "net_yield": 0.12, "dscr": 1.5, "cashflow_pm": 500.0 },
        "enrichment": { "epc_rating": "a", "flood_risk": "none" },
    });

    let uri = format!("/api/ranker/listings/{}", listing_id(1));
    let (status, res) = send(app(store.clone()), "POST", &uri, Some(body)).await;

    assert_eq!(status, StatusCode::OK);
    assert_approx(res["score"].as_f64().unwrap(), 100.0);
    assert_approx(res["factors"]["epc_score"].as_f64().unwrap(), 100.0);

    let stored = store.find(listing_id(1)).await.unwrap().unwrap();
    assert_approx(stored.rank_score.unwrap(), 100.0);
}

#[tokio::test]
async fn test_rank_listing_empty_body_uses_stored_snapshots() {
    let store = Arc::new(MemoryStore::new().with_listing(listing(2, ideal_kpis(), risky_enrichment())));

    let uri = format!("/api/ranker/listings/{}", listing_id(2));
    let (status, res) = send(app(store), "POST", &uri, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_approx(res["factors"]["risk_score"].as_f64().unwrap(), 15.0);
    assert_approx(res["score"].as_f64().unwrap(), 81.5);
}

#[tokio::test]
async fn test_rank_listing_missing_is_404() {
    let uri = format!("/api/ranker/listings/{}", listing_id(9));
    let (status, res) = send(app(Arc::new(MemoryStore::new())), "POST", &uri, Some(json!({}))).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(res["code"], "not_found");
}

#[tokio::test]
async fn test_rank_listing_malformed_body_is_400() {
    let store = Arc::new(MemoryStore::new().with_listing(listing(3, ideal_kpis(), ideal_enrichment())));
    let uri = format!("/api/ranker/listings/{}", listing_id(3));

    let request = Request::builder()
        .method("POST")
        .uri(&uri)
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app(store).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_recalculate_returns_summary() {
    let store = Arc::new(
        MemoryStore::new()
            .with_listing(listing(1, ideal_kpis(), ideal_enrichment()))
            .with_listing(listing(2, KpiSnapshot::default(), EnrichmentSnapshot::default())),
    );

    let (status, res) = send(app(store.clone()), "POST", "/api/ranker/recalculate", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(res["processed"], 2);
    assert_eq!(res["errors"], 0);
    assert!(res["run_id"].is_string());

    let (status, top) = send(app(store), "GET", "/api/ranker/top?limit=1", None).await;
    assert_eq!(status, StatusCode::OK);
    let top = top.as_array().unwrap();
    assert_eq!(top.len(), 1);
    assert_eq!(top[0]["listing_id"], listing_id(1).to_string());
}

#[tokio::test]
async fn test_weights_reflect_flag() {
    let store = Arc::new(MemoryStore::new());
    let (_, defaults) = send(app(store.clone()), "GET", "/api/ranker/weights", None).await;
    assert_approx(defaults["weights"]["net_yield"].as_f64().unwrap(), 0.35);
    assert_eq!(defaults["normalised"], true);

    let skewed = Arc::new(
        MemoryStore::new().with_flag("ranking_weights", weights_json(0.5, 0.5, 0.5, 0.0, 0.0)),
    );
    let (status, res) = send(app(skewed), "GET", "/api/ranker/weights", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_approx(res["sum"].as_f64().unwrap(), 1.5);
    assert_eq!(res["normalised"], false);
}

#[tokio::test]
async fn test_adjusted_metrics_lookup() {
    let store = Arc::new(MemoryStore::new().with_adjusted(adjusted_row(4)));

    let uri = format!("/api/adjusted-metrics/{}", listing_id(4));
    let (status, res) = send(app(store.clone()), "GET", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(res["epc_rating"], "E");
    assert_eq!(res["epc_target_rating"], "C");

    let uri = format!("/api/adjusted-metrics/{}", listing_id(5));
    let (status, _) = send(app(store.clone()), "GET", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, list) = send(app(store), "GET", "/api/adjusted-metrics", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);
}
