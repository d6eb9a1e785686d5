//! Circuit breaker for endpoint protection.
//!
//! # States
//! - Closed: normal scoring applies
//! - Open: endpoint scores zero and is skipped by exploitation
//!
//! # State Transitions
//! ```text
//! Closed → Open: consecutive_failures >= trip_threshold
//! Open → Closed: the next recorded success (streak resets to 0)
//! ```
//!
//! # Design Decisions
//! - State is derived from the failure streak, never stored
//! - No half-open probe: the exploration fallback is the only way back in

use serde::Serialize;

use crate::stats::EndpointSnapshot;

/// Default number of consecutive failures that trips the breaker.
pub const DEFAULT_TRIP_THRESHOLD: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    Closed,
    Open,
}

impl CircuitState {
    /// Derive the breaker state of an endpoint from its snapshot.
    pub fn of(snapshot: &EndpointSnapshot, trip_threshold: u32) -> Self {
        if snapshot.consecutive_failures >= trip_threshold {
            CircuitState::Open
        } else {
            CircuitState::Closed
        }
    }

    pub fn is_open(self) -> bool {
        self == CircuitState::Open
    }
}

/// A change in breaker state observed across one recorded outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Tripped,
    Recovered,
}

impl Transition {
    pub fn between(before: CircuitState, after: CircuitState) -> Option<Self> {
        match (before, after) {
            (CircuitState::Closed, CircuitState::Open) => Some(Transition::Tripped),
            (CircuitState::Open, CircuitState::Closed) => Some(Transition::Recovered),
            _ => None,
        }
    }
}
