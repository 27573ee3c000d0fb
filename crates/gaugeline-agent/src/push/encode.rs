//! Snapshot → wire payload.
//!
//! Two encodings exist; a deployment uses exactly one, chosen by
//! `push.encoding` when the pipeline is built.

use bytes::Bytes;
use prometheus::proto::{Metric, MetricFamily, MetricType};
use prometheus::{Encoder, TextEncoder};

use gaugeline_core::error::{GaugelineError, Result};
use gaugeline_core::protocol::remote_write::{self, Label, TimeSeries, WriteRequest, METRIC_NAME_LABEL};

use crate::config::PushEncoding;
use crate::obs::PushSnapshot;

pub const TEXT_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

/// Encoded body plus the headers that describe it.
#[derive(Debug, Clone)]
pub struct EncodedPayload {
    pub body: Bytes,
    pub content_type: &'static str,
    pub headers: Vec<(&'static str, &'static str)>,
    /// Number of series carried.
    pub series: usize,
}

pub trait PayloadEncoder: Send + Sync {
    fn encoding(&self) -> PushEncoding;

    /// Consumes the snapshot; each snapshot is encoded once.
    fn encode(&self, snapshot: PushSnapshot) -> Result<EncodedPayload>;
}

pub fn encoder_for(encoding: PushEncoding) -> Box<dyn PayloadEncoder> {
    match encoding {
        PushEncoding::RemoteWrite => Box::new(RemoteWriteEncoder),
        PushEncoding::Text => Box::new(TextExpositionEncoder),
    }
}

/// One `TimeSeries` per series, one sample each, snappy-compressed.
///
/// Histograms and summaries forward only their sample sum; per-bucket detail
/// is not pushed.
#[derive(Debug, Default)]
pub struct RemoteWriteEncoder;

impl RemoteWriteEncoder {
    pub fn write_request(snapshot: &PushSnapshot) -> WriteRequest {
        let ts = snapshot.timestamp_ms();
        let timeseries = snapshot
            .families()
            .iter()
            .flat_map(|mf| mf.get_metric().iter().map(move |m| series_of(mf, m, ts)))
            .collect();
        WriteRequest { timeseries }
    }
}

impl PayloadEncoder for RemoteWriteEncoder {
    fn encoding(&self) -> PushEncoding {
        PushEncoding::RemoteWrite
    }

    fn encode(&self, snapshot: PushSnapshot) -> Result<EncodedPayload> {
        let req = Self::write_request(&snapshot);
        let series = req.timeseries.len();
        let body = remote_write::encode_compressed(&req)?;
        Ok(EncodedPayload {
            body,
            content_type: remote_write::CONTENT_TYPE,
            headers: vec![
                ("Content-Encoding", remote_write::CONTENT_ENCODING),
                (remote_write::VERSION_HEADER, remote_write::VERSION),
            ],
            series,
        })
    }
}

fn series_of(mf: &MetricFamily, m: &Metric, timestamp_ms: i64) -> TimeSeries {
    let mut labels = Vec::with_capacity(m.get_label().len() + 1);
    labels.push(Label::new(METRIC_NAME_LABEL, mf.get_name()));
    labels.extend(
        m.get_label()
            .iter()
            .map(|p| Label::new(p.get_name(), p.get_value())),
    );
    TimeSeries::single(labels, sample_value(mf.get_field_type(), m), timestamp_ms)
}

fn sample_value(kind: MetricType, m: &Metric) -> f64 {
    match kind {
        MetricType::COUNTER => m.get_counter().get_value(),
        MetricType::GAUGE => m.get_gauge().get_value(),
        MetricType::HISTOGRAM => m.get_histogram().get_sample_sum(),
        MetricType::SUMMARY => m.get_summary().get_sample_sum(),
        MetricType::UNTYPED => m.get_untyped().get_value(),
    }
}

/// Same body the pull endpoint serves.
#[derive(Debug, Default)]
pub struct TextExpositionEncoder;

impl PayloadEncoder for TextExpositionEncoder {
    fn encoding(&self) -> PushEncoding {
        PushEncoding::Text
    }

    fn encode(&self, snapshot: PushSnapshot) -> Result<EncodedPayload> {
        let mut buf = Vec::new();
        TextEncoder::new()
            .encode(snapshot.families(), &mut buf)
            .map_err(|e| GaugelineError::Encode(format!("text exposition: {e}")))?;
        Ok(EncodedPayload {
            body: Bytes::from(buf),
            content_type: TEXT_CONTENT_TYPE,
            headers: Vec::new(),
            series: snapshot.series_count(),
        })
    }
}
