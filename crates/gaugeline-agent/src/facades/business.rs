use std::sync::Arc;
use std::time::Duration;

use crate::obs::{report, MetricsRegistry};

pub const USERS_REGISTERED: &str = "users_registered_total";
pub const USERS_LOGGED_IN: &str = "users_logged_in_total";
pub const USERS_ACTIVE: &str = "users_active";
pub const MATCHES_STARTED: &str = "matches_started_total";
pub const MATCHES_COMPLETED: &str = "matches_completed_total";
pub const MATCH_DURATION: &str = "match_duration_seconds";
pub const MATCHES_ACTIVE: &str = "matches_active";
pub const LEADERBOARD_UPDATES: &str = "leaderboard_updates_total";

/// User, match and leaderboard metrics.
#[derive(Clone)]
pub struct BusinessMetrics {
    registry: Arc<MetricsRegistry>,
}

impl BusinessMetrics {
    pub fn new(registry: Arc<MetricsRegistry>) -> Self {
        Self { registry }
    }

    pub fn user_registered(&self) {
        report(USERS_REGISTERED, self.registry.increment_counter(USERS_REGISTERED, &[]));
    }

    pub fn user_logged_in(&self) {
        report(USERS_LOGGED_IN, self.registry.increment_counter(USERS_LOGGED_IN, &[]));
    }

    pub fn set_active_users(&self, count: f64) {
        report(USERS_ACTIVE, self.registry.set_gauge(USERS_ACTIVE, count, &[]));
    }

    pub fn match_started(&self, match_type: &str) {
        report(
            MATCHES_STARTED,
            self.registry.increment_counter(MATCHES_STARTED, &[("type", match_type)]),
        );
    }

    /// Counts the completion and records its duration under the same `type`.
    pub fn match_completed(&self, match_type: &str, elapsed: Duration) {
        let labels = [("type", match_type)];
        report(
            MATCHES_COMPLETED,
            self.registry.increment_counter(MATCHES_COMPLETED, &labels),
        );
        report(
            MATCH_DURATION,
            self.registry
                .record_histogram(MATCH_DURATION, elapsed.as_secs_f64(), &labels),
        );
    }

    pub fn set_active_matches(&self, count: f64) {
        report(MATCHES_ACTIVE, self.registry.set_gauge(MATCHES_ACTIVE, count, &[]));
    }

    pub fn leaderboard_updated(&self) {
        report(LEADERBOARD_UPDATES, self.registry.increment_counter(LEADERBOARD_UPDATES, &[]));
    }
}
