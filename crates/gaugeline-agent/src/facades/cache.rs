use std::sync::Arc;

use crate::obs::{report, MetricsRegistry};

pub const HITS: &str = "cache_hits_total";
pub const MISSES: &str = "cache_misses_total";
pub const HIT_RATIO: &str = "cache_hit_ratio";
pub const EVICTIONS: &str = "cache_evictions_total";
pub const SIZE: &str = "cache_size_bytes";

/// Cache metrics, labelled by cache `type`.
#[derive(Clone)]
pub struct CacheMetrics {
    registry: Arc<MetricsRegistry>,
}

impl CacheMetrics {
    pub fn new(registry: Arc<MetricsRegistry>) -> Self {
        Self { registry }
    }

    pub fn hit(&self, cache_type: &str) {
        report(HITS, self.registry.increment_counter(HITS, &[("type", cache_type)]));
    }

    pub fn miss(&self, cache_type: &str) {
        report(MISSES, self.registry.increment_counter(MISSES, &[("type", cache_type)]));
    }

    pub fn set_hit_ratio(&self, cache_type: &str, ratio: f64) {
        report(HIT_RATIO, self.registry.set_gauge(HIT_RATIO, ratio, &[("type", cache_type)]));
    }

    pub fn eviction(&self, cache_type: &str) {
        report(EVICTIONS, self.registry.increment_counter(EVICTIONS, &[("type", cache_type)]));
    }

    pub fn set_size(&self, cache_type: &str, bytes: f64) {
        report(SIZE, self.registry.set_gauge(SIZE, bytes, &[("type", cache_type)]));
    }
}
