//! gaugeline agent library.
//!
//! Dynamic metrics registry, HTTP instrumentation, domain facades, the pull
//! endpoint and the remote push pipeline. Consumed by the binary (`main.rs`)
//! and by integration tests.

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

pub mod app_state;
pub mod config;
pub mod facades;
pub mod http;
pub mod obs;
pub mod ops;
pub mod push;
pub mod router;
