//! Shared error type across gaugeline crates.

use thiserror::Error;

/// Stable error codes (safe to log, match on, or surface to operators).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Label key set differs from the schema bound to the metric name.
    SchemaMismatch,
    /// Invalid caller input (negative counter delta, bad name, ...).
    InvalidArgument,
    /// Name already registered under a different metric kind.
    Registration,
    /// Snapshot / collection step failed.
    Gather,
    /// Payload serialization or compression failed.
    Encode,
    /// Network failure or non-success HTTP status.
    Transmit,
    /// Invalid configuration.
    Config,
    /// Unsupported config version.
    UnsupportedVersion,
    /// Internal error.
    Internal,
}

impl ErrorCode {
    /// String representation used in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::SchemaMismatch => "SCHEMA_MISMATCH",
            ErrorCode::InvalidArgument => "INVALID_ARGUMENT",
            ErrorCode::Registration => "REGISTRATION",
            ErrorCode::Gather => "GATHER",
            ErrorCode::Encode => "ENCODE",
            ErrorCode::Transmit => "TRANSMIT",
            ErrorCode::Config => "CONFIG",
            ErrorCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, GaugelineError>;

/// Unified error type used by core and agent.
#[derive(Debug, Error)]
pub enum GaugelineError {
    #[error("label schema mismatch for {name}: bound {expected:?}, got {got:?}")]
    SchemaMismatch {
        name: String,
        expected: Vec<String>,
        got: Vec<String>,
    },
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("registration failed: {0}")]
    Registration(String),
    #[error("gather failed: {0}")]
    Gather(String),
    #[error("encode failed: {0}")]
    Encode(String),
    #[error("transmit failed: {0}")]
    Transmit(String),
    #[error("push rejected with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("config: {0}")]
    Config(String),
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("internal: {0}")]
    Internal(String),
}

impl GaugelineError {
    /// Map an error to its stable code.
    pub fn code(&self) -> ErrorCode {
        match self {
            GaugelineError::SchemaMismatch { .. } => ErrorCode::SchemaMismatch,
            GaugelineError::InvalidArgument(_) => ErrorCode::InvalidArgument,
            GaugelineError::Registration(_) => ErrorCode::Registration,
            GaugelineError::Gather(_) => ErrorCode::Gather,
            GaugelineError::Encode(_) => ErrorCode::Encode,
            GaugelineError::Transmit(_) | GaugelineError::Status { .. } => ErrorCode::Transmit,
            GaugelineError::Config(_) => ErrorCode::Config,
            GaugelineError::UnsupportedVersion => ErrorCode::UnsupportedVersion,
            GaugelineError::Internal(_) => ErrorCode::Internal,
        }
    }
}
