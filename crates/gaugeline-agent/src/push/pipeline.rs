//! Periodic push loop.
//!
//! Per tick: snapshot → encode (→ compress) → send. Any failure is logged and
//! the tick is dropped; nothing is buffered and nothing is retried before the
//! next regular tick.
//!
//! Shutdown is only observed while waiting for a tick. A tick that has started
//! runs to completion (bounded by the sink's HTTP timeout).

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use gaugeline_core::error::Result;

use crate::obs::MetricsRegistry;
use crate::push::encode::PayloadEncoder;
use crate::push::sink::PushSink;

/// Shortest accepted tick interval. `tokio::time::interval` rejects zero.
pub const MIN_INTERVAL: Duration = Duration::from_millis(10);

/// Where the pipeline is within a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushPhase {
    Idle,
    Ticking,
    Encoding,
    Sending,
}

impl PushPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            PushPhase::Idle => "idle",
            PushPhase::Ticking => "snapshot",
            PushPhase::Encoding => "encode",
            PushPhase::Sending => "send",
        }
    }

    fn from_u8(v: u8) -> Self {
        match v {
            1 => PushPhase::Ticking,
            2 => PushPhase::Encoding,
            3 => PushPhase::Sending,
            _ => PushPhase::Idle,
        }
    }
}

impl std::fmt::Display for PushPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tick counters shared between the loop and observers.
#[derive(Debug, Default)]
pub struct PushStatus {
    attempts: AtomicU64,
    successes: AtomicU64,
    failures: AtomicU64,
    phase: AtomicU8,
}

impl PushStatus {
    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }
    pub fn successes(&self) -> u64 {
        self.successes.load(Ordering::Relaxed)
    }
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }
    pub fn phase(&self) -> PushPhase {
        PushPhase::from_u8(self.phase.load(Ordering::Relaxed))
    }

    fn enter(&self, phase: PushPhase) {
        self.phase.store(phase as u8, Ordering::Relaxed);
    }
}

/// Outcome of a successful tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PushReport {
    pub series: usize,
    pub bytes: usize,
}

pub struct PushPipeline {
    registry: Arc<MetricsRegistry>,
    encoder: Box<dyn PayloadEncoder>,
    sink: Arc<dyn PushSink>,
    interval: Duration,
    status: Arc<PushStatus>,
}

impl PushPipeline {
    pub fn new(
        registry: Arc<MetricsRegistry>,
        encoder: Box<dyn PayloadEncoder>,
        sink: Arc<dyn PushSink>,
        interval: Duration,
    ) -> Self {
        if interval < MIN_INTERVAL {
            tracing::warn!(
                requested_ms = interval.as_millis() as u64,
                min_ms = MIN_INTERVAL.as_millis() as u64,
                "push interval below minimum, clamped"
            );
        }
        Self {
            registry,
            encoder,
            sink,
            interval: interval.max(MIN_INTERVAL),
            status: Arc::new(PushStatus::default()),
        }
    }

    pub fn status(&self) -> Arc<PushStatus> {
        Arc::clone(&self.status)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run one tick. Errors are logged here; callers may ignore the result.
    pub async fn tick(&self) -> Result<PushReport> {
        self.status.attempts.fetch_add(1, Ordering::Relaxed);

        let res = self.run_phases().await;
        let phase = self.status.phase();
        self.status.enter(PushPhase::Idle);

        match &res {
            Ok(report) => {
                self.status.successes.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(
                    series = report.series,
                    bytes = report.bytes,
                    encoding = ?self.encoder.encoding(),
                    "metrics pushed"
                );
            }
            Err(e) => {
                self.status.failures.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(%phase, code = e.code().as_str(), error = %e, "metrics push failed");
            }
        }
        res
    }

    async fn run_phases(&self) -> Result<PushReport> {
        self.status.enter(PushPhase::Ticking);
        let snapshot = self.registry.snapshot()?;

        self.status.enter(PushPhase::Encoding);
        let payload = self.encoder.encode(snapshot)?;

        self.status.enter(PushPhase::Sending);
        self.sink.send(&payload).await?;

        Ok(PushReport {
            series: payload.series,
            bytes: payload.body.len(),
        })
    }

    /// Tick immediately, then once per interval, until `shutdown` fires.
    pub async fn run(self, shutdown: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            interval_ms = self.interval.as_millis() as u64,
            encoding = ?self.encoder.encoding(),
            "push pipeline started"
        );

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {}
            }
            let _ = self.tick().await;
        }

        tracing::info!("push pipeline stopped");
    }

    pub fn spawn(self, shutdown: CancellationToken) -> PushHandle {
        let status = self.status();
        let task = tokio::spawn(self.run(shutdown));
        PushHandle { task, status }
    }
}

/// Running pipeline task.
pub struct PushHandle {
    task: JoinHandle<()>,
    status: Arc<PushStatus>,
}

impl PushHandle {
    pub fn status(&self) -> Arc<PushStatus> {
        Arc::clone(&self.status)
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the loop to exit after cancellation.
    pub async fn join(self) {
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "push pipeline task failed");
        }
    }
}
