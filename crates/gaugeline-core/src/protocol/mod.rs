//! Push wire formats.
//!
//! Only the binary remote-write batch lives here; the text exposition format
//! is produced by the agent through the standard Prometheus encoder.
//!
//! Encoding and decoding are panic-free: failures surface as
//! `GaugelineError::Encode`.

pub mod remote_write;
