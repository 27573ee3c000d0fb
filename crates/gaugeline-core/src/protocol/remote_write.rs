//! Prometheus remote-write wire types and snappy framing.
//!
//! Message layout mirrors `prompb` (remote write 1.0):
//! - `WriteRequest { repeated TimeSeries timeseries = 1; }`
//! - `TimeSeries { repeated Label labels = 1; repeated Sample samples = 2; }`
//! - `Label { string name = 1; string value = 2; }`
//! - `Sample { double value = 1; int64 timestamp = 2; }`
//!
//! The body on the wire is the protobuf encoding compressed with the snappy
//! *block* format (not the framed stream format).

use bytes::Bytes;
use prost::Message;

use crate::error::{GaugelineError, Result};

/// Reserved label carrying the metric name.
pub const METRIC_NAME_LABEL: &str = "__name__";

pub const CONTENT_TYPE: &str = "application/x-protobuf";
pub const CONTENT_ENCODING: &str = "snappy";
pub const VERSION_HEADER: &str = "X-Prometheus-Remote-Write-Version";
pub const VERSION: &str = "0.1.0";

#[derive(Clone, PartialEq, Message)]
pub struct WriteRequest {
    #[prost(message, repeated, tag = "1")]
    pub timeseries: Vec<TimeSeries>,
}

#[derive(Clone, PartialEq, Message)]
pub struct TimeSeries {
    #[prost(message, repeated, tag = "1")]
    pub labels: Vec<Label>,
    #[prost(message, repeated, tag = "2")]
    pub samples: Vec<Sample>,
}

#[derive(Clone, PartialEq, Message)]
pub struct Label {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(string, tag = "2")]
    pub value: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct Sample {
    #[prost(double, tag = "1")]
    pub value: f64,
    /// Milliseconds since the UNIX epoch.
    #[prost(int64, tag = "2")]
    pub timestamp: i64,
}

impl Label {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl TimeSeries {
    /// Build a single-sample series. Labels are sorted by name, which remote
    /// write receivers require.
    pub fn single(mut labels: Vec<Label>, value: f64, timestamp: i64) -> Self {
        labels.sort_by(|a, b| a.name.cmp(&b.name));
        Self {
            labels,
            samples: vec![Sample { value, timestamp }],
        }
    }

    /// Value of the `__name__` label, if present.
    pub fn metric_name(&self) -> Option<&str> {
        self.labels
            .iter()
            .find(|l| l.name == METRIC_NAME_LABEL)
            .map(|l| l.value.as_str())
    }
}

/// Serialize and snappy-compress a write request.
pub fn encode_compressed(req: &WriteRequest) -> Result<Bytes> {
    let raw = req.encode_to_vec();
    let compressed = snap::raw::Encoder::new()
        .compress_vec(&raw)
        .map_err(|e| GaugelineError::Encode(format!("snappy compression failed: {e}")))?;
    Ok(Bytes::from(compressed))
}

/// Inverse of [`encode_compressed`]; used by receivers and tests.
pub fn decode_compressed(body: &[u8]) -> Result<WriteRequest> {
    let raw = snap::raw::Decoder::new()
        .decompress_vec(body)
        .map_err(|e| GaugelineError::Encode(format!("snappy decompression failed: {e}")))?;
    WriteRequest::decode(raw.as_slice())
        .map_err(|e| GaugelineError::Encode(format!("invalid write request: {e}")))
}
