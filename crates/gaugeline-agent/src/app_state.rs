//! Shared state for the ops router.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::MetricsConfig;
use crate::obs::MetricsRegistry;
use crate::push::PushStatus;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: MetricsConfig,
    registry: Arc<MetricsRegistry>,
    push_status: Option<Arc<PushStatus>>,
    draining: AtomicBool,
}

impl AppState {
    /// `push_status` is `None` when push is disabled.
    pub fn new(
        cfg: MetricsConfig,
        registry: Arc<MetricsRegistry>,
        push_status: Option<Arc<PushStatus>>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                cfg,
                registry,
                push_status,
                draining: AtomicBool::new(false),
            }),
        }
    }

    pub fn cfg(&self) -> &MetricsConfig {
        &self.inner.cfg
    }

    pub fn registry(&self) -> Arc<MetricsRegistry> {
        Arc::clone(&self.inner.registry)
    }

    pub fn push_status(&self) -> Option<Arc<PushStatus>> {
        self.inner.push_status.clone()
    }

    /// Flip readiness off. Irreversible.
    pub fn begin_draining(&self) {
        self.inner.draining.store(true, Ordering::Release);
    }

    pub fn is_draining(&self) -> bool {
        self.inner.draining.load(Ordering::Acquire)
    }
}
