use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::time::Duration;

use serde::Deserialize;
use gaugeline_core::error::{GaugelineError, Result};

use crate::obs::vector::bucket_problem;

/// Prometheus client default buckets (seconds).
pub const DEFAULT_BUCKETS: [f64; 11] = [
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricsConfig {
    pub version: u32,

    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Prefix on every exposed metric name.
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Secondary prefix, after the namespace.
    #[serde(default)]
    pub subsystem: String,

    /// Appended to every series.
    #[serde(default)]
    pub const_labels: BTreeMap<String, String>,

    /// Boundaries for histograms created without explicit buckets.
    #[serde(default = "default_buckets")]
    pub histogram_buckets: Vec<f64>,

    #[serde(default = "default_listen")]
    pub listen: String,

    #[serde(default)]
    pub http: HttpSection,

    #[serde(default)]
    pub push: PushConfig,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            version: 1,
            service_name: default_service_name(),
            namespace: default_namespace(),
            subsystem: String::new(),
            const_labels: BTreeMap::new(),
            histogram_buckets: default_buckets(),
            listen: default_listen(),
            http: HttpSection::default(),
            push: PushConfig::default(),
        }
    }
}

impl MetricsConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(GaugelineError::UnsupportedVersion);
        }
        if !self.namespace.is_empty() && !is_valid_name(&self.namespace) {
            return Err(GaugelineError::Config(format!(
                "namespace is not a valid metric name prefix: {}",
                self.namespace
            )));
        }
        if !self.subsystem.is_empty() && !is_valid_name(&self.subsystem) {
            return Err(GaugelineError::Config(format!(
                "subsystem is not a valid metric name prefix: {}",
                self.subsystem
            )));
        }
        for key in self.const_labels.keys() {
            if !is_valid_name(key) || key.starts_with(gaugeline_core::labels::RESERVED_PREFIX) {
                return Err(GaugelineError::Config(format!("invalid const label key: {key}")));
            }
        }
        validate_buckets("histogram_buckets", &self.histogram_buckets)?;
        self.listen
            .parse::<SocketAddr>()
            .map_err(|e| GaugelineError::Config(format!("listen must be a valid SocketAddr: {e}")))?;

        self.http.validate()?;
        self.push.validate()?;
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HttpSection {
    /// Instrument requests served by the ops router.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Boundaries for `http_request_duration_seconds`.
    #[serde(default = "default_buckets")]
    pub buckets: Vec<f64>,

    #[serde(default = "default_true")]
    pub metrics_endpoint: bool,

    #[serde(default = "default_true")]
    pub health_endpoint: bool,

    /// Request paths the instrumentation ignores, matched exactly against the
    /// URI path. The metrics endpoint is always ignored.
    #[serde(default)]
    pub skip_paths: Vec<String>,
}

impl Default for HttpSection {
    fn default() -> Self {
        Self {
            enabled: true,
            buckets: default_buckets(),
            metrics_endpoint: true,
            health_endpoint: true,
            skip_paths: Vec::new(),
        }
    }
}

impl HttpSection {
    pub fn validate(&self) -> Result<()> {
        validate_buckets("http.buckets", &self.buckets)?;
        if let Some(p) = self.skip_paths.iter().find(|p| !p.starts_with('/')) {
            return Err(GaugelineError::Config(format!(
                "http.skip_paths entries must start with '/': {p}"
            )));
        }
        Ok(())
    }
}

/// Wire encoding used by the push pipeline. Fixed per deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PushEncoding {
    /// Snappy-compressed protobuf `WriteRequest`.
    #[default]
    RemoteWrite,
    /// Prometheus text exposition, uncompressed.
    Text,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PushConfig {
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub user: String,

    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_push_interval_secs")]
    pub interval_secs: u64,

    #[serde(default = "default_push_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub encoding: PushEncoding,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            url: None,
            user: String::new(),
            api_key: None,
            interval_secs: default_push_interval_secs(),
            timeout_secs: default_push_timeout_secs(),
            encoding: PushEncoding::default(),
        }
    }
}

impl PushConfig {
    /// Push runs only when both a destination and a key are configured.
    pub fn is_enabled(&self) -> bool {
        let has = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        has(&self.url) && has(&self.api_key)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=3600).contains(&self.interval_secs) {
            return Err(GaugelineError::Config(
                "push.interval_secs must be between 1 and 3600".into(),
            ));
        }
        if !(1..=120).contains(&self.timeout_secs) {
            return Err(GaugelineError::Config(
                "push.timeout_secs must be between 1 and 120".into(),
            ));
        }
        if self.timeout_secs > self.interval_secs {
            return Err(GaugelineError::Config(
                "push.timeout_secs must not exceed push.interval_secs".into(),
            ));
        }
        if let Some(url) = self.url.as_deref().filter(|u| !u.is_empty()) {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(GaugelineError::Config(format!(
                    "push.url must be an http(s) URL: {url}"
                )));
            }
        }
        Ok(())
    }
}

fn validate_buckets(field: &str, buckets: &[f64]) -> Result<()> {
    match bucket_problem(buckets) {
        Some(problem) => Err(GaugelineError::Config(format!("{field} {problem}"))),
        None => Ok(()),
    }
}

/// `[a-zA-Z_][a-zA-Z0-9_]*`
pub(crate) fn is_valid_name(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn default_service_name() -> String {
    "app".into()
}
fn default_namespace() -> String {
    "app".into()
}
fn default_buckets() -> Vec<f64> {
    DEFAULT_BUCKETS.to_vec()
}
fn default_listen() -> String {
    "0.0.0.0:9100".into()
}
fn default_true() -> bool {
    true
}
fn default_push_interval_secs() -> u64 {
    15
}
fn default_push_timeout_secs() -> u64 {
    10
}
