//! Dynamic metric registry.
//!
//! Metrics are created lazily on first use. The first caller for a name binds
//! its label schema (the key set of the labels it passed); every later call
//! for that name must pass the same key set, in any order, or it is rejected
//! with `SchemaMismatch` and existing series are left untouched.
//!
//! Counters, gauges, and histograms live in three independent maps. Lookups
//! go through a shared read first; creation goes through the `DashMap` entry
//! API so resolve-or-create is atomic per name.
//!
//! A name is bound to one kind. Reusing it under another kind fails with
//! `Registration`, as does a counter or gauge named after a histogram's
//! `_bucket`/`_sum`/`_count` series. The latter check is not atomic with
//! creation: two threads creating `x` and `x_count` at the same instant can
//! both succeed.
//!
//! # Cardinality
//! Every distinct label *value* combination creates a series that lives for
//! the lifetime of the registry. Passing unbounded values (user ids, raw
//! paths, request ids) grows memory without bound.

use std::time::{SystemTime, UNIX_EPOCH};

use dashmap::DashMap;
use prometheus::core::Collector;
use prometheus::{CounterVec, Encoder, GaugeVec, HistogramVec, TextEncoder};

use gaugeline_core::error::{GaugelineError, Result};
use gaugeline_core::{LabelSchema, MetricKind};

use crate::config::MetricsConfig;
use crate::obs::snapshot::PushSnapshot;
use crate::obs::vector::{MetricVector, VectorOpts};

/// Series a histogram adds next to its own name.
const HISTOGRAM_SUFFIXES: [&str; 3] = ["_bucket", "_sum", "_count"];

/// Content type of [`MetricsRegistry::render`].
pub const EXPOSITION_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Count, sum, and cumulative buckets of one histogram series.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramStats {
    pub count: u64,
    pub sum: f64,
    /// `(upper_bound, cumulative_count)`, `+Inf` excluded.
    pub buckets: Vec<(f64, u64)>,
}

pub struct MetricsRegistry {
    opts: VectorOpts,
    default_buckets: Vec<f64>,
    registry: prometheus::Registry,
    counters: DashMap<String, MetricVector<CounterVec>>,
    gauges: DashMap<String, MetricVector<GaugeVec>>,
    histograms: DashMap<String, MetricVector<HistogramVec>>,
}

impl MetricsRegistry {
    pub fn new(cfg: &MetricsConfig) -> Self {
        Self {
            opts: VectorOpts {
                namespace: cfg.namespace.clone(),
                subsystem: cfg.subsystem.clone(),
                const_labels: cfg
                    .const_labels
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            },
            default_buckets: cfg.histogram_buckets.clone(),
            registry: prometheus::Registry::new(),
            counters: DashMap::new(),
            gauges: DashMap::new(),
            histograms: DashMap::new(),
        }
    }

    /// Name as it appears in the exposition and in pushed series.
    pub fn exposed_name(&self, name: &str) -> String {
        self.opts.fq_name(name)
    }

    // --------------------
    // Instrumentation surface
    // --------------------

    /// Increment a counter by 1.
    pub fn increment_counter(&self, name: &str, labels: &[(&str, &str)]) -> Result<()> {
        self.increment_counter_by(name, 1.0, labels)
    }

    /// Increment a counter by `delta`, which must be finite and non-negative.
    pub fn increment_counter_by(&self, name: &str, delta: f64, labels: &[(&str, &str)]) -> Result<()> {
        if !delta.is_finite() || delta < 0.0 {
            return Err(GaugelineError::InvalidArgument(format!(
                "counter {name}: delta must be finite and non-negative, got {delta}"
            )));
        }
        let vector = self.counter(name, labels)?;
        vector.series(name, labels)?.inc_by(delta);
        Ok(())
    }

    pub fn set_gauge(&self, name: &str, value: f64, labels: &[(&str, &str)]) -> Result<()> {
        let vector = self.gauge(name, labels)?;
        vector.series(name, labels)?.set(value);
        Ok(())
    }

    pub fn increment_gauge(&self, name: &str, labels: &[(&str, &str)]) -> Result<()> {
        let vector = self.gauge(name, labels)?;
        vector.series(name, labels)?.inc();
        Ok(())
    }

    pub fn decrement_gauge(&self, name: &str, labels: &[(&str, &str)]) -> Result<()> {
        let vector = self.gauge(name, labels)?;
        vector.series(name, labels)?.dec();
        Ok(())
    }

    /// Observe `value` against the registry's default buckets (or whatever
    /// buckets the name was created with).
    pub fn record_histogram(&self, name: &str, value: f64, labels: &[(&str, &str)]) -> Result<()> {
        let vector = self.histogram(name, labels, None)?;
        vector.series(name, labels)?.observe(value);
        Ok(())
    }

    /// Like [`record_histogram`](Self::record_histogram), but creates the
    /// metric with `buckets` if this is the first use of `name`. Ignored
    /// afterwards: boundaries are fixed at creation.
    pub fn record_histogram_with_buckets(
        &self,
        name: &str,
        value: f64,
        labels: &[(&str, &str)],
        buckets: &[f64],
    ) -> Result<()> {
        let vector = self.histogram(name, labels, Some(buckets))?;
        vector.series(name, labels)?.observe(value);
        Ok(())
    }

    // --------------------
    // Resolution
    // --------------------

    pub fn counter(&self, name: &str, labels: &[(&str, &str)]) -> Result<MetricVector<CounterVec>> {
        let schema = LabelSchema::from_pairs(labels)?;
        self.resolve(&self.counters, MetricKind::Counter, name, schema, |s| {
            self.opts.counter_vec(name, s)
        })
    }

    pub fn gauge(&self, name: &str, labels: &[(&str, &str)]) -> Result<MetricVector<GaugeVec>> {
        let schema = LabelSchema::from_pairs(labels)?;
        self.resolve(&self.gauges, MetricKind::Gauge, name, schema, |s| {
            self.opts.gauge_vec(name, s)
        })
    }

    pub fn histogram(
        &self,
        name: &str,
        labels: &[(&str, &str)],
        buckets: Option<&[f64]>,
    ) -> Result<MetricVector<HistogramVec>> {
        let schema = LabelSchema::from_pairs(labels)?;
        self.resolve(&self.histograms, MetricKind::Histogram, name, schema, |s| {
            let buckets = buckets.map_or_else(|| self.default_buckets.clone(), <[f64]>::to_vec);
            self.opts.histogram_vec(name, s, buckets)
        })
    }

    fn resolve<V>(
        &self,
        map: &DashMap<String, MetricVector<V>>,
        kind: MetricKind,
        name: &str,
        schema: LabelSchema,
        build: impl FnOnce(&LabelSchema) -> Result<V>,
    ) -> Result<MetricVector<V>>
    where
        V: Collector + Clone + 'static,
    {
        // Fast path: already bound.
        if let Some(existing) = map.get(name) {
            check_schema(name, existing.value(), &schema)?;
            return Ok(existing.value().clone());
        }

        self.check_histogram_shadowing(kind, name)?;

        let entry = map.entry(name.to_string()).or_try_insert_with(|| {
            let inner = build(&schema)?;
            self.registry
                .register(Box::new(inner.clone()))
                .map_err(|e| GaugelineError::Registration(format!("{kind} {name}: {e}")))?;
            tracing::debug!(metric = %name, %kind, labels = ?schema.keys(), "metric registered");
            Ok::<_, GaugelineError>(MetricVector::new(schema.clone(), inner))
        })?;
        let vector = entry.value().clone();
        drop(entry);

        // Another caller may have won the race with a different key set.
        check_schema(name, &vector, &schema)?;
        Ok(vector)
    }

    /// A histogram `x` exposes `x_bucket`, `x_sum` and `x_count`. A counter or
    /// gauge under one of those names would duplicate its series, so whichever
    /// comes second fails with `Registration`.
    ///
    /// Runs outside the entry lock: taking a shard lock of another map while
    /// holding one could deadlock against the mirror-image call.
    fn check_histogram_shadowing(&self, kind: MetricKind, name: &str) -> Result<()> {
        let clash = match kind {
            MetricKind::Histogram => HISTOGRAM_SUFFIXES
                .iter()
                .map(|suffix| format!("{name}{suffix}"))
                .find(|n| self.counters.contains_key(n) || self.gauges.contains_key(n)),
            MetricKind::Counter | MetricKind::Gauge => HISTOGRAM_SUFFIXES
                .iter()
                .filter_map(|suffix| name.strip_suffix(suffix))
                .find(|stem| self.histograms.contains_key(*stem))
                .map(str::to_string),
        };
        match clash {
            Some(other) => Err(GaugelineError::Registration(format!(
                "{kind} {name} collides with the exposed series of {other}"
            ))),
            None => Ok(()),
        }
    }

    // --------------------
    // Read access
    // --------------------

    /// Current value of one counter series, if it exists.
    pub fn counter_value(&self, name: &str, labels: &[(&str, &str)]) -> Option<f64> {
        let v = self.counters.get(name)?;
        v.value()
            .find_series(labels)
            .map(|m| m.get_counter().get_value())
    }

    /// Current value of one gauge series, if it exists.
    pub fn gauge_value(&self, name: &str, labels: &[(&str, &str)]) -> Option<f64> {
        let v = self.gauges.get(name)?;
        v.value()
            .find_series(labels)
            .map(|m| m.get_gauge().get_value())
    }

    pub fn histogram_stats(&self, name: &str, labels: &[(&str, &str)]) -> Option<HistogramStats> {
        let v = self.histograms.get(name)?;
        let m = v.value().find_series(labels)?;
        let h = m.get_histogram();
        Some(HistogramStats {
            count: h.get_sample_count(),
            sum: h.get_sample_sum(),
            buckets: h
                .get_bucket()
                .iter()
                .map(|b| (b.get_upper_bound(), b.get_cumulative_count()))
                .collect(),
        })
    }

    /// Names bound for `kind`, sorted.
    pub fn registered(&self, kind: MetricKind) -> Vec<String> {
        let mut names: Vec<String> = match kind {
            MetricKind::Counter => self.counters.iter().map(|e| e.key().clone()).collect(),
            MetricKind::Gauge => self.gauges.iter().map(|e| e.key().clone()).collect(),
            MetricKind::Histogram => self.histograms.iter().map(|e| e.key().clone()).collect(),
        };
        names.sort();
        names
    }

    // --------------------
    // Exposition / snapshot
    // --------------------

    /// Prometheus text exposition of every series. Computed fresh per call.
    pub fn render(&self) -> Result<String> {
        let mut buf = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buf)
            .map_err(|e| GaugelineError::Encode(format!("text exposition: {e}")))?;
        String::from_utf8(buf)
            .map_err(|e| GaugelineError::Encode(format!("text exposition not utf-8: {e}")))
    }

    /// Copy every series for one push tick.
    pub fn snapshot(&self) -> Result<PushSnapshot> {
        let timestamp_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| GaugelineError::Gather(format!("system clock before UNIX epoch: {e}")))?
            .as_millis();
        let timestamp_ms = i64::try_from(timestamp_ms)
            .map_err(|_| GaugelineError::Gather("timestamp out of range".into()))?;
        Ok(PushSnapshot::new(self.registry.gather(), timestamp_ms))
    }
}

fn check_schema<V>(name: &str, vector: &MetricVector<V>, schema: &LabelSchema) -> Result<()> {
    if vector.schema() == schema {
        return Ok(());
    }
    Err(GaugelineError::SchemaMismatch {
        name: name.to_string(),
        expected: vector.schema().keys().to_vec(),
        got: schema.keys().to_vec(),
    })
}
