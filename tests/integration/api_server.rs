//! Integration tests for the API server over the full fetch pipeline

#[path = "test_utils.rs"]
mod test_utils;

use serde_json::Value;

use test_utils::TestApp;

#[tokio::test]
async fn health_endpoint_reports_healthy_when_upstream_answers() {
    let app = TestApp::new().await;
    let response = app.server.get("/health").await;
    assert_eq!(response.status_code(), 200);

    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert!(body["uptime_seconds"].as_u64().is_some());
    assert_eq!(body["service"], "macrofeed");
}

#[tokio::test]
async fn metrics_endpoint_exposes_prometheus_metrics() {
    let app = TestApp::new().await;
    let response = app.server.get("/metrics").await;
    assert_eq!(response.status_code(), 200);

    let body = response.text();
    assert!(
        body.contains("http_requests_total"),
        "Expected http_requests_total metric"
    );
    assert!(
        body.contains("http_request_duration_seconds"),
        "Expected http_request_duration_seconds metric"
    );
    assert!(
        body.contains("http_requests_in_flight"),
        "Expected http_requests_in_flight metric"
    );
}

#[tokio::test]
async fn quote_endpoint_serves_a_resolved_quote() {
    let app = TestApp::new().await;
    let response = app.server.get("/api/quotes/SPY").await;
    assert_eq!(response.status_code(), 200);

    let body: Value = response.json();
    assert_eq!(body["symbol"], "SPY");
    assert_eq!(body["current"], 452.3);
    assert_eq!(body["previous"], 450.1);
    assert_eq!(body["source_id"], "yahoo");
}

#[tokio::test]
async fn quote_endpoint_serves_from_cache_on_repeat() {
    let app = TestApp::new().await;
    let first = app.server.get("/api/quotes/SPY").await;
    assert_eq!(first.status_code(), 200);

    let second = app.server.get("/api/quotes/SPY").await;
    assert_eq!(second.status_code(), 200);

    // Only the first request should have reached the upstream.
    let usage = app.server.get("/api/usage").await;
    let body: Value = usage.json();
    assert_eq!(body["yahoo"]["calls"], 1);
}

#[tokio::test]
async fn unknown_symbol_is_a_404() {
    let app = TestApp::new().await;
    let response = app.server.get("/api/quotes/NOPE").await;
    assert_eq!(response.status_code(), 404);
}

#[tokio::test]
async fn market_data_endpoint_bundles_snapshot_and_analytics() {
    let app = TestApp::new().await;
    let response = app.server.get("/api/market-data").await;
    assert_eq!(response.status_code(), 200);

    let body: Value = response.json();
    assert_eq!(body["snapshot"]["quotes"]["SPY"]["current"], 452.3);
    // No rates instruments are configured, so analytics degrade to
    // unknown instead of failing.
    assert_eq!(body["analytics"]["risk_signals"]["volatility"], "unknown");
    assert!(body["analytics"]["curve_spreads"]["spread_2s10s"].is_null());
}

#[tokio::test]
async fn usage_endpoint_tracks_provider_calls() {
    let app = TestApp::new().await;
    let _ = app.server.get("/api/quotes/SPY").await;

    let response = app.server.get("/api/usage").await;
    assert_eq!(response.status_code(), 200);

    let body: Value = response.json();
    assert!(body["yahoo"]["calls"].as_u64().unwrap() >= 1);
    assert_eq!(body["yahoo"]["errors"], 0);
}
