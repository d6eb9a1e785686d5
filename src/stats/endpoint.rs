//! Per-endpoint performance history.
//!
//! # Responsibilities
//! - Identify an endpoint (`EndpointId`)
//! - Hold the rolling outcome and latency windows in lockstep
//! - Keep lifetime counters and the consecutive failure streak
//! - Produce immutable snapshots for scoring

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::stats::window::RollingWindow;

/// Opaque endpoint identifier. Ordered numerically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EndpointId(pub u32);

impl fmt::Display for EndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "endpoint-{}", self.0)
    }
}

impl From<u32> for EndpointId {
    fn from(id: u32) -> Self {
        EndpointId(id)
    }
}

/// Mutable history of one endpoint. Owned by the tracker behind a lock.
#[derive(Debug, Clone)]
pub struct EndpointStats {
    id: EndpointId,
    /// 1.0 for success, 0.0 for failure.
    recent_outcomes: RollingWindow,
    recent_latencies: RollingWindow,
    total_successes: u64,
    total_failures: u64,
    consecutive_failures: u32,
}

impl EndpointStats {
    pub fn new(id: EndpointId, capacity: usize) -> Self {
        Self {
            id,
            recent_outcomes: RollingWindow::new(capacity),
            recent_latencies: RollingWindow::new(capacity),
            total_successes: 0,
            total_failures: 0,
            consecutive_failures: 0,
        }
    }

    /// Record one call. The caller validates `latency_ms`.
    pub fn record(&mut self, success: bool, latency_ms: f64) {
        self.recent_outcomes.push(if success { 1.0 } else { 0.0 });
        self.recent_latencies.push(latency_ms);

        if success {
            self.total_successes += 1;
            self.consecutive_failures = 0;
        } else {
            self.total_failures += 1;
            self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        }
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Recent outcomes, oldest first.
    pub fn recent_outcomes(&self) -> impl Iterator<Item = bool> + '_ {
        self.recent_outcomes.iter().map(|v| v > 0.5)
    }

    /// Recent latencies, oldest first.
    pub fn recent_latencies(&self) -> impl Iterator<Item = f64> + '_ {
        self.recent_latencies.iter()
    }

    pub fn snapshot(&self) -> EndpointSnapshot {
        EndpointSnapshot {
            id: self.id,
            recent_samples: self.recent_outcomes.len(),
            recent_successes: self.recent_outcomes.sum().round() as usize,
            recent_latency_sum: self.recent_latencies.sum(),
            consecutive_failures: self.consecutive_failures,
            total_successes: self.total_successes,
            total_failures: self.total_failures,
            window_capacity: self.recent_outcomes.capacity(),
        }
    }
}

/// Immutable view of an endpoint's history, as seen by scoring and reporting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EndpointSnapshot {
    pub id: EndpointId,
    /// Length of both rolling windows.
    pub recent_samples: usize,
    pub recent_successes: usize,
    pub recent_latency_sum: f64,
    pub consecutive_failures: u32,
    pub total_successes: u64,
    pub total_failures: u64,
    pub window_capacity: usize,
}

impl EndpointSnapshot {
    /// Snapshot of an endpoint that has never been called.
    pub fn empty(id: EndpointId, window_capacity: usize) -> Self {
        Self {
            id,
            recent_samples: 0,
            recent_successes: 0,
            recent_latency_sum: 0.0,
            consecutive_failures: 0,
            total_successes: 0,
            total_failures: 0,
            window_capacity,
        }
    }

    /// Fraction of recent calls that succeeded, `None` without history.
    pub fn success_rate(&self) -> Option<f64> {
        if self.recent_samples == 0 {
            None
        } else {
            Some(self.recent_successes as f64 / self.recent_samples as f64)
        }
    }

    /// Mean recent latency, `None` without history.
    pub fn mean_latency(&self) -> Option<f64> {
        if self.recent_samples == 0 {
            None
        } else {
            Some((self.recent_latency_sum / self.recent_samples as f64).max(0.0))
        }
    }

    pub fn total_calls(&self) -> u64 {
        self.total_successes + self.total_failures
    }
}
