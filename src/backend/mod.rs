//! Backend collaborator boundary.
//!
//! # Data Flow
//! ```text
//! Feedback loop → Backend::call(endpoint)
//!     → Ok(CallOutcome { success, latency_ms })
//!     → Err(BackendError) on transport failure
//!     → never resolves (hang), cut off by the loop's timeout
//! ```
//!
//! # Design Decisions
//! - The core never performs real transport; implementations are supplied
//! - simulated.rs provides a seeded, scenario-driven harness for the driver

pub mod simulated;

use std::future::Future;

use serde::Serialize;
use thiserror::Error;

use crate::stats::EndpointId;

pub use simulated::{BackendSummary, EndpointProfile, EndpointSummary, Scenario, SimulatedBackend};

/// Observed result of one call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CallOutcome {
    pub success: bool,
    pub latency_ms: f64,
}

impl CallOutcome {
    pub fn success(latency_ms: f64) -> Self {
        Self {
            success: true,
            latency_ms,
        }
    }

    pub fn failure(latency_ms: f64) -> Self {
        Self {
            success: false,
            latency_ms,
        }
    }
}

/// A call that produced no outcome at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("{0} is not served by this backend")]
    Unavailable(EndpointId),
}

/// Something that can serve a call on behalf of an endpoint.
pub trait Backend: Send + Sync {
    fn call(
        &self,
        endpoint: EndpointId,
    ) -> impl Future<Output = Result<CallOutcome, BackendError>> + Send;
}
