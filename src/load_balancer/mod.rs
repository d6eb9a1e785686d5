//! Endpoint selection subsystem.
//!
//! # Data Flow
//! ```text
//! Feedback loop asks for next endpoint
//!     → Apply selection policy:
//!         - adaptive.rs (score candidates, exploit best, explore when all look bad)
//!         - round_robin.rs (rotate, skipping open circuits)
//!     → Return chosen EndpointId
//! ```
//!
//! # Design Decisions
//! - Policies read published snapshots only; they never block writers
//! - Randomness is injected so exploration is reproducible under a seed
//! - Empty candidate sets are a configuration error, not a panic

pub mod adaptive;
pub mod round_robin;

use std::fmt;

use serde::Serialize;

use crate::error::Result;
use crate::stats::EndpointId;

pub use adaptive::AdaptivePolicy;
pub use round_robin::RoundRobin;

/// How a selection was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMode {
    /// Highest score won.
    Exploit,
    /// Every score was below the exploration threshold; uniform pick.
    Explore,
    /// Positional rotation.
    Rotate,
}

impl SelectionMode {
    pub fn as_str(self) -> &'static str {
        match self {
            SelectionMode::Exploit => "exploit",
            SelectionMode::Explore => "explore",
            SelectionMode::Rotate => "rotate",
        }
    }
}

/// Result of one selection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Selection {
    pub endpoint: EndpointId,
    pub mode: SelectionMode,
    /// Best candidate score, when the policy scores at all.
    pub best_score: Option<f64>,
}

/// A strategy for choosing the endpoint that serves the next call.
pub trait SelectionPolicy: Send + Sync + fmt::Debug {
    /// Choose among `candidates`, reporting how the choice was made.
    fn select(&self, candidates: &[EndpointId]) -> Result<Selection>;

    /// Choose among `candidates`.
    fn pick(&self, candidates: &[EndpointId]) -> Result<EndpointId> {
        self.select(candidates).map(|selection| selection.endpoint)
    }

    /// Consecutive failures at which this policy treats an endpoint as tripped.
    fn trip_threshold(&self) -> u32;

    fn name(&self) -> &'static str;
}
