//! In-process metrics: dynamic registry, vectors, and snapshots.
//!
//! The registry is an explicit object shared by `Arc`; nothing here is global,
//! so tests build isolated instances.

pub mod registry;
pub mod snapshot;
pub mod vector;

pub use registry::{HistogramStats, MetricsRegistry, EXPOSITION_CONTENT_TYPE};
pub use snapshot::PushSnapshot;
pub use vector::{MetricVector, VectorOpts};

/// Log a rejected update and carry on. For callers that treat metrics as
/// fire-and-forget.
pub fn report(metric: &str, res: gaugeline_core::Result<()>) {
    if let Err(e) = res {
        tracing::warn!(metric, code = e.code().as_str(), error = %e, "metric update rejected");
    }
}
