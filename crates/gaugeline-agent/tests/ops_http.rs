#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header::CONTENT_TYPE, Request, StatusCode};
use axum::{middleware, routing::get as route_get, Router};
use tower::ServiceExt;

use gaugeline_agent::app_state::AppState;
use gaugeline_agent::config::MetricsConfig;
use gaugeline_agent::http::{track_http, HttpMetrics};
use gaugeline_agent::obs::{MetricsRegistry, EXPOSITION_CONTENT_TYPE};
use gaugeline_agent::router::build_router;
use gaugeline_core::MetricKind;

fn setup(cfg: MetricsConfig) -> (Router, AppState) {
    let registry = Arc::new(MetricsRegistry::new(&cfg));
    let state = AppState::new(cfg, registry, None);
    (build_router(state.clone()).unwrap(), state)
}

async fn get(router: &Router, uri: &str) -> (StatusCode, String, Option<String>) {
    let resp = router
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    let content_type = resp
        .headers()
        .get(CONTENT_TYPE)
        .map(|v| v.to_str().unwrap().to_string());
    let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap(), content_type)
}

fn requests(state: &AppState, path: &str, status: &str) -> Option<f64> {
    state.registry().counter_value(
        "http_requests_total",
        &[("method", "GET"), ("path", path), ("status", status)],
    )
}

#[tokio::test]
async fn metrics_endpoint_serves_exposition() {
    let (router, state) = setup(MetricsConfig::default());
    state.registry().set_gauge("workers", 4.0, &[]).unwrap();

    let (status, body, content_type) = get(&router, "/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some(EXPOSITION_CONTENT_TYPE));
    assert!(body.contains("app_workers 4"), "{body}");
}

#[tokio::test]
async fn healthz_reports_service() {
    let mut cfg = MetricsConfig::default();
    cfg.service_name = "matchmaker".into();
    let (router, _) = setup(cfg);

    let (status, body, _) = get(&router, "/healthz").await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["service"], "matchmaker");
}

#[tokio::test]
async fn readyz_flips_when_draining() {
    let (router, state) = setup(MetricsConfig::default());

    let (status, body, _) = get(&router, "/readyz").await;
    assert_eq!((status, body.as_str()), (StatusCode::OK, "ready"));

    state.begin_draining();
    let (status, body, _) = get(&router, "/readyz").await;
    assert_eq!((status, body.as_str()), (StatusCode::SERVICE_UNAVAILABLE, "draining"));
}

#[tokio::test]
async fn middleware_counts_requests_by_route() {
    let (router, state) = setup(MetricsConfig::default());

    get(&router, "/healthz").await;
    get(&router, "/healthz").await;
    get(&router, "/readyz").await;

    assert_eq!(requests(&state, "/healthz", "200"), Some(2.0));
    assert_eq!(requests(&state, "/readyz", "200"), Some(1.0));

    let duration = state
        .registry()
        .histogram_stats(
            "http_request_duration_seconds",
            &[("method", "GET"), ("path", "/healthz"), ("status", "200")],
        )
        .unwrap();
    assert_eq!(duration.count, 2);

    let sizes = state
        .registry()
        .histogram_stats("http_response_size_bytes", &[("method", "GET"), ("path", "/healthz")])
        .unwrap();
    assert_eq!(sizes.count, 2);
    assert_eq!(sizes.buckets.first().map(|b| b.0), Some(100.0));

    // no request is in flight once responses are back
    assert_eq!(state.registry().gauge_value("http_requests_in_flight", &[]), Some(0.0));
}

#[tokio::test]
async fn middleware_skips_metrics_endpoint() {
    let (router, state) = setup(MetricsConfig::default());

    get(&router, "/metrics").await;
    get(&router, "/metrics").await;

    assert!(requests(&state, "/metrics", "200").is_none());
    assert!(state.registry().registered(MetricKind::Counter).is_empty());
}

#[tokio::test]
async fn unknown_routes_share_one_label() {
    let (router, state) = setup(MetricsConfig::default());

    let (status, _, _) = get(&router, "/users/123").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    get(&router, "/users/456").await;

    assert_eq!(requests(&state, "unmatched", "404"), Some(2.0));
}

#[tokio::test]
async fn instrumentation_can_be_disabled() {
    let mut cfg = MetricsConfig::default();
    cfg.http.enabled = false;
    let (router, state) = setup(cfg);

    get(&router, "/healthz").await;
    assert!(state.registry().registered(MetricKind::Counter).is_empty());
}

#[tokio::test]
async fn endpoints_can_be_unmounted() {
    let mut cfg = MetricsConfig::default();
    cfg.http.metrics_endpoint = false;
    cfg.http.health_endpoint = false;
    let (router, _) = setup(cfg);

    assert_eq!(get(&router, "/metrics").await.0, StatusCode::NOT_FOUND);
    assert_eq!(get(&router, "/healthz").await.0, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn configured_skip_paths_are_not_measured() {
    let mut cfg = MetricsConfig::default();
    cfg.http.skip_paths = vec!["/readyz".into()];
    let (router, state) = setup(cfg);

    get(&router, "/readyz").await;
    get(&router, "/healthz").await;

    assert!(requests(&state, "/readyz", "200").is_none());
    assert_eq!(requests(&state, "/healthz", "200"), Some(1.0));
}

#[tokio::test]
async fn skipper_excludes_matching_requests() {
    let cfg = MetricsConfig::default();
    let registry = Arc::new(MetricsRegistry::new(&cfg));
    let metrics = HttpMetrics::new(Arc::clone(&registry), &cfg.http)
        .unwrap()
        .with_skipper(|req| req.headers().contains_key("x-internal"));
    let router = Router::new()
        .route("/work", route_get(|| async { "done" }))
        .layer(middleware::from_fn_with_state(Arc::new(metrics), track_http));

    let internal = Request::builder()
        .uri("/work")
        .header("x-internal", "1")
        .body(Body::empty())
        .unwrap();
    assert_eq!(router.clone().oneshot(internal).await.unwrap().status(), StatusCode::OK);
    get(&router, "/work").await;

    let labels = [("method", "GET"), ("path", "/work"), ("status", "200")];
    assert_eq!(registry.counter_value("http_requests_total", &labels), Some(1.0));
}
