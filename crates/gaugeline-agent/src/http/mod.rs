//! HTTP request instrumentation.
//!
//! Applied as an axum layer on the ops router. The path label is the matched
//! route template (never the raw URI) to keep cardinality bounded; requests
//! that match no route are labelled `unmatched`. The metrics endpoint itself
//! is never measured; `http.skip_paths` and [`HttpMetrics::with_skipper`]
//! exclude more.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::HttpBody;
use axum::extract::{MatchedPath, Request, State};
use axum::http::header::CONTENT_LENGTH;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;

use gaugeline_core::error::{GaugelineError, Result};

use crate::config::HttpSection;
use crate::obs::{report, MetricsRegistry};

pub const METRICS_PATH: &str = "/metrics";

pub const REQUESTS_TOTAL: &str = "http_requests_total";
pub const REQUEST_DURATION: &str = "http_request_duration_seconds";
pub const REQUEST_SIZE: &str = "http_request_size_bytes";
pub const RESPONSE_SIZE: &str = "http_response_size_bytes";
pub const REQUESTS_IN_FLIGHT: &str = "http_requests_in_flight";

/// Caller-supplied rule for requests that should not be measured.
pub type Skipper = Box<dyn Fn(&Request) -> bool + Send + Sync>;

pub struct HttpMetrics {
    registry: Arc<MetricsRegistry>,
    duration_buckets: Vec<f64>,
    size_buckets: Vec<f64>,
    skip_paths: Vec<String>,
    skipper: Option<Skipper>,
}

impl HttpMetrics {
    pub fn new(registry: Arc<MetricsRegistry>, cfg: &HttpSection) -> Result<Self> {
        // 100B .. 100MB
        let size_buckets = prometheus::exponential_buckets(100.0, 10.0, 7)
            .map_err(|e| GaugelineError::Internal(format!("size buckets: {e}")))?;
        Ok(Self {
            registry,
            duration_buckets: cfg.buckets.clone(),
            size_buckets,
            skip_paths: cfg.skip_paths.clone(),
            skipper: None,
        })
    }

    /// Also skip any request for which `skip` returns true.
    pub fn with_skipper(mut self, skip: impl Fn(&Request) -> bool + Send + Sync + 'static) -> Self {
        self.skipper = Some(Box::new(skip));
        self
    }

    fn skips(&self, req: &Request) -> bool {
        let path = req.uri().path();
        path == METRICS_PATH
            || self.skip_paths.iter().any(|p| p == path)
            || self.skipper.as_ref().is_some_and(|skip| skip(req))
    }

    /// Record one finished request.
    pub fn observe(&self, req: &RequestInfo<'_>, status: u16, elapsed: Duration, response_size: Option<u64>) {
        let status = status.to_string();
        let full = [("method", req.method), ("path", req.path), ("status", status.as_str())];
        let short = [("method", req.method), ("path", req.path)];

        report(REQUESTS_TOTAL, self.registry.increment_counter(REQUESTS_TOTAL, &full));
        report(
            REQUEST_DURATION,
            self.registry.record_histogram_with_buckets(
                REQUEST_DURATION,
                elapsed.as_secs_f64(),
                &full,
                &self.duration_buckets,
            ),
        );

        if let Some(size) = req.size.filter(|s| *s > 0) {
            report(
                REQUEST_SIZE,
                self.registry
                    .record_histogram_with_buckets(REQUEST_SIZE, size as f64, &short, &self.size_buckets),
            );
        }
        if let Some(size) = response_size.filter(|s| *s > 0) {
            report(
                RESPONSE_SIZE,
                self.registry
                    .record_histogram_with_buckets(RESPONSE_SIZE, size as f64, &short, &self.size_buckets),
            );
        }
    }

    fn in_flight(&self) -> InFlight<'_> {
        report(REQUESTS_IN_FLIGHT, self.registry.increment_gauge(REQUESTS_IN_FLIGHT, &[]));
        InFlight { registry: &self.registry }
    }
}

/// Request attributes captured before the handler runs.
#[derive(Debug, Clone, Copy)]
pub struct RequestInfo<'a> {
    pub method: &'a str,
    pub path: &'a str,
    pub size: Option<u64>,
}

/// Decrements the in-flight gauge on drop, including on early return.
struct InFlight<'a> {
    registry: &'a MetricsRegistry,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        report(REQUESTS_IN_FLIGHT, self.registry.decrement_gauge(REQUESTS_IN_FLIGHT, &[]));
    }
}

fn content_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
}

/// `axum::middleware::from_fn_with_state` entry point.
pub async fn track_http(State(metrics): State<Arc<HttpMetrics>>, req: Request, next: Next) -> Response {
    if metrics.skips(&req) {
        return next.run(req).await;
    }

    let method = req.method().as_str().to_owned();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_owned());
    let size = content_length(req.headers());

    let start = Instant::now();
    let resp = {
        let _guard = metrics.in_flight();
        next.run(req).await
    };

    let response_size = resp
        .body()
        .size_hint()
        .exact()
        .or_else(|| content_length(resp.headers()));

    let info = RequestInfo {
        method: &method,
        path: &path,
        size,
    };
    metrics.observe(&info, resp.status().as_u16(), start.elapsed(), response_size);
    resp
}
