//! Domain helpers over the registry with fixed metric names.
//!
//! Every call is fire-and-forget: a rejected update is logged at `warn` and
//! the caller continues.

mod business;
mod cache;
mod database;
mod websocket;

pub use business::BusinessMetrics;
pub use cache::CacheMetrics;
pub use database::DatabaseMetrics;
pub use websocket::WebSocketMetrics;
