//! Metric vectors bound to a label schema.
//!
//! A `MetricVector` pairs a prometheus `*Vec` (which owns the series and their
//! atomics) with the `LabelSchema` fixed by the first caller.

use std::collections::HashMap;

use prometheus::core::{Collector, MetricVec, MetricVecBuilder};
use prometheus::proto::{LabelPair, Metric};
use prometheus::{CounterVec, GaugeVec, HistogramOpts, HistogramVec, Opts};

use gaugeline_core::error::{GaugelineError, Result};
use gaugeline_core::LabelSchema;

/// Naming and constant labels shared by every vector of one registry.
#[derive(Debug, Clone, Default)]
pub struct VectorOpts {
    pub namespace: String,
    pub subsystem: String,
    pub const_labels: HashMap<String, String>,
}

impl VectorOpts {
    fn opts(&self, name: &str, help: String) -> Opts {
        Opts::new(name, help)
            .namespace(self.namespace.clone())
            .subsystem(self.subsystem.clone())
            .const_labels(self.const_labels.clone())
    }

    /// Exposed name: `namespace_subsystem_name`, empty parts skipped.
    pub fn fq_name(&self, name: &str) -> String {
        [self.namespace.as_str(), self.subsystem.as_str(), name]
            .iter()
            .filter(|p| !p.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join("_")
    }

    pub(crate) fn counter_vec(&self, name: &str, schema: &LabelSchema) -> Result<CounterVec> {
        CounterVec::new(self.opts(name, format!("{name} counter")), &schema.key_refs())
            .map_err(|e| invalid(name, e))
    }

    pub(crate) fn gauge_vec(&self, name: &str, schema: &LabelSchema) -> Result<GaugeVec> {
        GaugeVec::new(self.opts(name, format!("{name} gauge")), &schema.key_refs())
            .map_err(|e| invalid(name, e))
    }

    pub(crate) fn histogram_vec(
        &self,
        name: &str,
        schema: &LabelSchema,
        buckets: Vec<f64>,
    ) -> Result<HistogramVec> {
        if let Some(problem) = bucket_problem(&buckets) {
            return Err(GaugelineError::InvalidArgument(format!(
                "metric {name}: buckets {problem}"
            )));
        }
        let opts = HistogramOpts::new(name, format!("{name} histogram"))
            .namespace(self.namespace.clone())
            .subsystem(self.subsystem.clone())
            .const_labels(self.const_labels.clone())
            .buckets(buckets);
        HistogramVec::new(opts, &schema.key_refs()).map_err(|e| invalid(name, e))
    }
}

/// Why `buckets` cannot back a histogram, if anything. Prometheus only checks
/// ordering when the first series is created, which is too late.
pub(crate) fn bucket_problem(buckets: &[f64]) -> Option<&'static str> {
    if buckets.is_empty() {
        return Some("must not be empty");
    }
    if buckets.iter().any(|b| !b.is_finite()) {
        return Some("must be finite");
    }
    if buckets.windows(2).any(|w| w[0] >= w[1]) {
        return Some("must be strictly increasing");
    }
    None
}

fn invalid(name: &str, e: prometheus::Error) -> GaugelineError {
    GaugelineError::InvalidArgument(format!("metric {name}: {e}"))
}

/// A lazily created vector and the label schema it is bound to.
#[derive(Clone)]
pub struct MetricVector<V> {
    schema: LabelSchema,
    inner: V,
}

impl<V> MetricVector<V> {
    pub(crate) fn new(schema: LabelSchema, inner: V) -> Self {
        Self { schema, inner }
    }

    pub fn schema(&self) -> &LabelSchema {
        &self.schema
    }

    pub fn inner(&self) -> &V {
        &self.inner
    }
}

impl<T: MetricVecBuilder> MetricVector<MetricVec<T>> {
    /// Get or create the series for `labels`.
    pub fn series(&self, name: &str, labels: &[(&str, &str)]) -> Result<T::M> {
        let map: HashMap<&str, &str> = labels.iter().copied().collect();
        self.inner.get_metric_with(&map).map_err(|e| {
            let got = LabelSchema::from_pairs(labels).ok();
            if got.as_ref() == Some(&self.schema) {
                return invalid(name, e);
            }
            GaugelineError::SchemaMismatch {
                name: name.to_string(),
                expected: self.schema.keys().to_vec(),
                got: labels.iter().map(|(k, _)| (*k).to_string()).collect(),
            }
        })
    }

    /// Look up an existing series without creating it.
    pub(crate) fn find_series(&self, labels: &[(&str, &str)]) -> Option<Metric> {
        if LabelSchema::from_pairs(labels).ok()? != self.schema {
            return None;
        }
        self.inner
            .collect()
            .into_iter()
            .flat_map(|mf| mf.get_metric().to_vec())
            .find(|m| labels_match(m.get_label(), labels))
    }
}

/// Every requested pair is present. Const labels ride along in `pairs` and
/// are ignored.
fn labels_match(pairs: &[LabelPair], labels: &[(&str, &str)]) -> bool {
    labels.iter().all(|(k, v)| {
        pairs
            .iter()
            .any(|p| p.get_name() == *k && p.get_value() == *v)
    })
}
