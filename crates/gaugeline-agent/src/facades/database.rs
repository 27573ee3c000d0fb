use std::sync::Arc;
use std::time::Duration;

use crate::obs::{report, MetricsRegistry};

pub const QUERY_DURATION: &str = "database_query_duration_seconds";
pub const QUERIES_TOTAL: &str = "database_queries_total";
pub const CONNECTIONS_ACTIVE: &str = "database_connections_active";
pub const POOL_SIZE: &str = "database_connection_pool_size";

#[derive(Clone)]
pub struct DatabaseMetrics {
    registry: Arc<MetricsRegistry>,
}

impl DatabaseMetrics {
    pub fn new(registry: Arc<MetricsRegistry>) -> Self {
        Self { registry }
    }

    /// Record one query. `status` is `success` or `error`.
    pub fn query_executed(&self, operation: &str, elapsed: Duration, success: bool) {
        let status = if success { "success" } else { "error" };
        let labels = [("operation", operation), ("status", status)];
        report(
            QUERY_DURATION,
            self.registry
                .record_histogram(QUERY_DURATION, elapsed.as_secs_f64(), &labels),
        );
        report(QUERIES_TOTAL, self.registry.increment_counter(QUERIES_TOTAL, &labels));
    }

    pub fn connection_opened(&self) {
        report(CONNECTIONS_ACTIVE, self.registry.increment_gauge(CONNECTIONS_ACTIVE, &[]));
    }

    pub fn connection_closed(&self) {
        report(CONNECTIONS_ACTIVE, self.registry.decrement_gauge(CONNECTIONS_ACTIVE, &[]));
    }

    pub fn set_connection_pool_size(&self, size: f64) {
        report(POOL_SIZE, self.registry.set_gauge(POOL_SIZE, size, &[]));
    }
}
