//! Remote push of registry snapshots.
//!
//! When `push.url` or `push.api_key` is unset the pipeline is never spawned:
//! no client is built and no request is ever made.

pub mod encode;
pub mod pipeline;
pub mod sink;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use gaugeline_core::error::Result;

use crate::config::PushConfig;
use crate::obs::MetricsRegistry;

pub use encode::{encoder_for, EncodedPayload, PayloadEncoder, RemoteWriteEncoder, TextExpositionEncoder};
pub use pipeline::{PushHandle, PushPhase, PushPipeline, PushReport, PushStatus, MIN_INTERVAL};
pub use sink::{HttpSink, PushSink, USER_AGENT};

/// Spawn the pipeline over `sink` if push is configured.
pub fn spawn_if_enabled(
    cfg: &PushConfig,
    registry: Arc<MetricsRegistry>,
    sink: Arc<dyn PushSink>,
    shutdown: CancellationToken,
) -> Option<PushHandle> {
    if !cfg.is_enabled() {
        tracing::info!("push disabled (push.url / push.api_key not set)");
        return None;
    }
    let pipeline = PushPipeline::new(registry, encoder_for(cfg.encoding), sink, cfg.interval());
    Some(pipeline.spawn(shutdown))
}

/// Production entry: HTTP sink built from config.
pub fn start(
    cfg: &PushConfig,
    registry: Arc<MetricsRegistry>,
    shutdown: CancellationToken,
) -> Result<Option<PushHandle>> {
    if !cfg.is_enabled() {
        tracing::info!("push disabled (push.url / push.api_key not set)");
        return Ok(None);
    }
    let sink = Arc::new(HttpSink::from_config(cfg)?);
    Ok(spawn_if_enabled(cfg, registry, sink, shutdown))
}
