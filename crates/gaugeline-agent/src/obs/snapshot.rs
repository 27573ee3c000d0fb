use prometheus::proto::MetricFamily;

/// Point-in-time copy of every series, taken once per push tick.
///
/// Each series value is read atomically; there is no atomicity across series.
#[derive(Debug)]
pub struct PushSnapshot {
    families: Vec<MetricFamily>,
    timestamp_ms: i64,
}

impl PushSnapshot {
    pub(crate) fn new(families: Vec<MetricFamily>, timestamp_ms: i64) -> Self {
        Self {
            families,
            timestamp_ms,
        }
    }

    pub fn families(&self) -> &[MetricFamily] {
        &self.families
    }

    /// Wall-clock time of the tick, ms since the UNIX epoch.
    pub fn timestamp_ms(&self) -> i64 {
        self.timestamp_ms
    }

    pub fn series_count(&self) -> usize {
        self.families.iter().map(|mf| mf.get_metric().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.series_count() == 0
    }
}
