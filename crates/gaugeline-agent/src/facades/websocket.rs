use std::sync::Arc;

use crate::obs::{report, MetricsRegistry};

pub const CONNECTIONS_ACTIVE: &str = "websocket_connections_active";
pub const CONNECTIONS_TOTAL: &str = "websocket_connections_total";
pub const MESSAGES_SENT: &str = "websocket_messages_sent_total";
pub const MESSAGES_RECEIVED: &str = "websocket_messages_received_total";
pub const ROOMS_CREATED: &str = "websocket_rooms_created_total";
pub const ROOMS_CLOSED: &str = "websocket_rooms_closed_total";
pub const ROOMS_ACTIVE: &str = "websocket_rooms_active";
pub const ROOM_CLIENTS: &str = "websocket_room_clients";

/// Connection, message and room metrics for a WebSocket server.
#[derive(Clone)]
pub struct WebSocketMetrics {
    registry: Arc<MetricsRegistry>,
}

impl WebSocketMetrics {
    pub fn new(registry: Arc<MetricsRegistry>) -> Self {
        Self { registry }
    }

    pub fn connection_opened(&self) {
        report(CONNECTIONS_ACTIVE, self.registry.increment_gauge(CONNECTIONS_ACTIVE, &[]));
        report(CONNECTIONS_TOTAL, self.registry.increment_counter(CONNECTIONS_TOTAL, &[]));
    }

    pub fn connection_closed(&self) {
        report(CONNECTIONS_ACTIVE, self.registry.decrement_gauge(CONNECTIONS_ACTIVE, &[]));
    }

    pub fn message_sent(&self, message_type: &str) {
        report(
            MESSAGES_SENT,
            self.registry.increment_counter(MESSAGES_SENT, &[("type", message_type)]),
        );
    }

    pub fn message_received(&self, message_type: &str) {
        report(
            MESSAGES_RECEIVED,
            self.registry.increment_counter(MESSAGES_RECEIVED, &[("type", message_type)]),
        );
    }

    pub fn room_created(&self, room_type: &str) {
        report(ROOMS_CREATED, self.registry.increment_counter(ROOMS_CREATED, &[("type", room_type)]));
    }

    pub fn room_closed(&self, room_type: &str) {
        report(ROOMS_CLOSED, self.registry.increment_counter(ROOMS_CLOSED, &[("type", room_type)]));
    }

    pub fn set_active_rooms(&self, count: f64) {
        report(ROOMS_ACTIVE, self.registry.set_gauge(ROOMS_ACTIVE, count, &[]));
    }

    /// Per-room client count. One series per room id; callers own the cardinality.
    pub fn set_room_clients(&self, room_id: &str, count: f64) {
        report(
            ROOM_CLIENTS,
            self.registry.set_gauge(ROOM_CLIENTS, count, &[("room_id", room_id)]),
        );
    }
}
