//! Axum router wiring for the ops server.

use std::sync::Arc;

use axum::{middleware, routing::get, Router};

use gaugeline_core::error::Result;

use crate::app_state::AppState;
use crate::http::{track_http, HttpMetrics, METRICS_PATH};
use crate::ops;

pub fn build_router(state: AppState) -> Result<Router> {
    let http = &state.cfg().http;
    let mut router = Router::new();

    if http.metrics_endpoint {
        router = router.route(METRICS_PATH, get(ops::metrics));
    }
    if http.health_endpoint {
        router = router
            .route("/healthz", get(ops::healthz))
            .route("/readyz", get(ops::readyz));
    }
    router = router.fallback(ops::not_found);

    if http.enabled {
        let metrics = Arc::new(HttpMetrics::new(state.registry(), http)?);
        router = router.layer(middleware::from_fn_with_state(metrics, track_http));
    }

    Ok(router.with_state(state))
}
