//! Error types shared by the stats, selection and feedback subsystems.

use thiserror::Error;

use crate::config::validation::{join_errors, ValidationError};
use crate::stats::EndpointId;

/// Errors raised by the balancer core.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BalancerError {
    /// The id was never registered with the stats tracker.
    #[error("unknown endpoint: {0}")]
    UnknownEndpoint(EndpointId),

    /// No valid choice exists for the requested operation.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A scorer or policy was built with out-of-range parameters.
    #[error("invalid parameters: {}", join_errors(.0))]
    InvalidParameters(Vec<ValidationError>),

    /// Latency measurements must be finite and non-negative.
    #[error("invalid latency measurement: {0}")]
    InvalidLatency(f64),
}

pub type Result<T> = std::result::Result<T, BalancerError>;
