//! gaugeline core: transport-agnostic metric primitives, error types, and the
//! remote-write wire format.
//!
//! This crate carries no runtime or HTTP dependencies so the wire format can
//! be reused by receivers and test tooling.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here.
//! All fallible paths surface as `GaugelineError`/`Result`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod labels;
pub mod protocol;

pub use error::{ErrorCode, GaugelineError, Result};
pub use labels::{LabelSchema, MetricKind};
