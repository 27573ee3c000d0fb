#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;
use std::time::Duration;

use gaugeline_agent::config::MetricsConfig;
use gaugeline_agent::facades::{BusinessMetrics, CacheMetrics, DatabaseMetrics, WebSocketMetrics};
use gaugeline_agent::obs::MetricsRegistry;

fn registry() -> Arc<MetricsRegistry> {
    Arc::new(MetricsRegistry::new(&MetricsConfig::default()))
}

#[test]
fn websocket_connections_and_rooms() {
    let r = registry();
    let ws = WebSocketMetrics::new(Arc::clone(&r));

    ws.connection_opened();
    ws.connection_opened();
    ws.connection_closed();
    ws.message_sent("chat");
    ws.message_received("chat");
    ws.message_received("chat");
    ws.room_created("duel");
    ws.room_closed("duel");
    ws.set_active_rooms(3.0);
    ws.set_room_clients("r-1", 2.0);

    assert_eq!(r.gauge_value("websocket_connections_active", &[]), Some(1.0));
    assert_eq!(r.counter_value("websocket_connections_total", &[]), Some(2.0));
    assert_eq!(r.counter_value("websocket_messages_sent_total", &[("type", "chat")]), Some(1.0));
    assert_eq!(
        r.counter_value("websocket_messages_received_total", &[("type", "chat")]),
        Some(2.0)
    );
    assert_eq!(r.counter_value("websocket_rooms_created_total", &[("type", "duel")]), Some(1.0));
    assert_eq!(r.counter_value("websocket_rooms_closed_total", &[("type", "duel")]), Some(1.0));
    assert_eq!(r.gauge_value("websocket_rooms_active", &[]), Some(3.0));
    assert_eq!(r.gauge_value("websocket_room_clients", &[("room_id", "r-1")]), Some(2.0));
}

#[test]
fn cache_hits_and_misses() {
    let r = registry();
    let cache = CacheMetrics::new(Arc::clone(&r));

    cache.hit("redis");
    cache.hit("redis");
    cache.miss("redis");
    cache.eviction("lru");
    cache.set_hit_ratio("redis", 0.66);
    cache.set_size("lru", 4096.0);

    assert_eq!(r.counter_value("cache_hits_total", &[("type", "redis")]), Some(2.0));
    assert_eq!(r.counter_value("cache_misses_total", &[("type", "redis")]), Some(1.0));
    assert_eq!(r.counter_value("cache_evictions_total", &[("type", "lru")]), Some(1.0));
    assert_eq!(r.gauge_value("cache_hit_ratio", &[("type", "redis")]), Some(0.66));
    assert_eq!(r.gauge_value("cache_size_bytes", &[("type", "lru")]), Some(4096.0));
}

#[test]
fn database_queries_split_by_outcome() {
    let r = registry();
    let db = DatabaseMetrics::new(Arc::clone(&r));

    db.query_executed("select", Duration::from_millis(20), true);
    db.query_executed("select", Duration::from_millis(30), false);
    db.connection_opened();
    db.set_connection_pool_size(10.0);

    let ok = [("operation", "select"), ("status", "success")];
    let failed = [("operation", "select"), ("status", "error")];
    assert_eq!(r.counter_value("database_queries_total", &ok), Some(1.0));
    assert_eq!(r.counter_value("database_queries_total", &failed), Some(1.0));

    let stats = r.histogram_stats("database_query_duration_seconds", &failed).unwrap();
    assert_eq!(stats.count, 1);
    assert!((stats.sum - 0.03).abs() < 1e-9);

    assert_eq!(r.gauge_value("database_connections_active", &[]), Some(1.0));
    db.connection_closed();
    assert_eq!(r.gauge_value("database_connections_active", &[]), Some(0.0));
    assert_eq!(r.gauge_value("database_connection_pool_size", &[]), Some(10.0));
}

#[test]
fn business_matches_and_users() {
    let r = registry();
    let biz = BusinessMetrics::new(Arc::clone(&r));

    biz.user_registered();
    biz.user_logged_in();
    biz.user_logged_in();
    biz.set_active_users(12.0);
    biz.match_started("ranked");
    biz.match_completed("ranked", Duration::from_secs(90));
    biz.set_active_matches(0.0);
    biz.leaderboard_updated();

    assert_eq!(r.counter_value("users_registered_total", &[]), Some(1.0));
    assert_eq!(r.counter_value("users_logged_in_total", &[]), Some(2.0));
    assert_eq!(r.gauge_value("users_active", &[]), Some(12.0));
    assert_eq!(r.counter_value("matches_started_total", &[("type", "ranked")]), Some(1.0));
    assert_eq!(r.counter_value("matches_completed_total", &[("type", "ranked")]), Some(1.0));
    assert_eq!(
        r.histogram_stats("match_duration_seconds", &[("type", "ranked")]).unwrap().sum,
        90.0
    );
    assert_eq!(r.gauge_value("matches_active", &[]), Some(0.0));
    assert_eq!(r.counter_value("leaderboard_updates_total", &[]), Some(1.0));
}

#[test]
fn rejected_updates_do_not_disturb_existing_series() {
    let r = registry();
    r.increment_counter("cache_hits_total", &[("region", "eu")]).unwrap();

    // bound to a different key set; logged and dropped
    CacheMetrics::new(Arc::clone(&r)).hit("redis");

    assert_eq!(r.counter_value("cache_hits_total", &[("region", "eu")]), Some(1.0));
    assert!(r.counter_value("cache_hits_total", &[("type", "redis")]).is_none());
}
