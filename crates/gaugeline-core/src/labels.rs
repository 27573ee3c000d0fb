//! Metric kinds and label schemas.
//!
//! A label schema is the *set* of label keys bound to a metric name. Callers
//! pass labels as unordered `(key, value)` pairs; the schema keeps the keys
//! sorted so two calls supplying the same keys in a different order bind to
//! the same schema.

use crate::error::{GaugelineError, Result};

/// The three metric kinds held by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    Counter,
    Gauge,
    Histogram,
}

impl MetricKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
            MetricKind::Histogram => "histogram",
        }
    }
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Label keys with this prefix belong to the exposition format.
pub const RESERVED_PREFIX: &str = "__";

/// Sorted, duplicate-free set of label keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct LabelSchema {
    keys: Vec<String>,
}

impl LabelSchema {
    /// Derive the schema from a caller-supplied label set.
    ///
    /// A repeated key is rejected: the value it should carry is ambiguous.
    /// Keys starting with `__` are reserved (`__name__` is added on push).
    pub fn from_pairs(labels: &[(&str, &str)]) -> Result<Self> {
        if let Some((key, _)) = labels.iter().find(|(k, _)| k.starts_with(RESERVED_PREFIX)) {
            return Err(GaugelineError::InvalidArgument(format!(
                "label key {key} uses the reserved {RESERVED_PREFIX} prefix"
            )));
        }

        let mut keys: Vec<String> = labels.iter().map(|(k, _)| (*k).to_string()).collect();
        keys.sort();

        if let Some(dup) = keys.windows(2).find(|w| w[0] == w[1]) {
            return Err(GaugelineError::InvalidArgument(format!(
                "duplicate label key: {}",
                dup[0]
            )));
        }

        Ok(Self { keys })
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn key_refs(&self) -> Vec<&str> {
        self.keys.iter().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
