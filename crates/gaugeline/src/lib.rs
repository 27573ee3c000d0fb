//! Top-level facade crate for gaugeline.
//!
//! Re-exports the core types and the agent library so users can depend on a single crate.

pub mod core {
    pub use gaugeline_core::*;
}

pub mod agent {
    pub use gaugeline_agent::*;
}

pub use gaugeline_agent::obs::MetricsRegistry;
pub use gaugeline_agent::config::MetricsConfig;
