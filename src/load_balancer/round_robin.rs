//! Round-robin selection strategy.
//!
//! Baseline policy: rotates through candidates and skips endpoints whose
//! circuit is open. When every circuit is open it falls back to plain rotation.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::error::{BalancerError, Result};
use crate::load_balancer::{Selection, SelectionMode, SelectionPolicy};
use crate::observability::metrics;
use crate::resilience::circuit_breaker::CircuitState;
use crate::stats::{EndpointId, StatsTracker};

/// Round-robin selector.
/// Stores an internal counter to rotate through candidates.
#[derive(Debug)]
pub struct RoundRobin {
    stats: Arc<StatsTracker>,
    trip_threshold: u32,
    counter: AtomicUsize,
}

impl RoundRobin {
    pub fn new(stats: Arc<StatsTracker>, trip_threshold: u32) -> Self {
        Self {
            stats,
            trip_threshold,
            counter: AtomicUsize::new(0),
        }
    }
}

impl SelectionPolicy for RoundRobin {
    fn select(&self, candidates: &[EndpointId]) -> Result<Selection> {
        if candidates.is_empty() {
            return Err(BalancerError::Configuration(
                "no candidate endpoints to select from".to_string(),
            ));
        }

        let mut states = Vec::with_capacity(candidates.len());
        for &id in candidates {
            let snapshot = self.stats.snapshot(id)?;
            states.push(CircuitState::of(&snapshot, self.trip_threshold));
        }

        let start = self.counter.fetch_add(1, Ordering::Relaxed);
        let len = candidates.len();
        let index = (0..len)
            .map(|i| (start + i) % len)
            .find(|&index| !states[index].is_open())
            .unwrap_or(start % len);

        let endpoint = candidates[index];
        metrics::record_selection(endpoint, SelectionMode::Rotate);
        Ok(Selection {
            endpoint,
            mode: SelectionMode::Rotate,
            best_score: None,
        })
    }

    fn trip_threshold(&self) -> u32 {
        self.trip_threshold
    }

    fn name(&self) -> &'static str {
        "round_robin"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_robin() {
        let ids = vec![EndpointId(1), EndpointId(2)];
        let stats = Arc::new(StatsTracker::with_endpoints(20, ids.clone()));
        let lb = RoundRobin::new(stats, 3);

        assert_eq!(lb.pick(&ids).unwrap(), EndpointId(1));
        assert_eq!(lb.pick(&ids).unwrap(), EndpointId(2));
        assert_eq!(lb.pick(&ids).unwrap(), EndpointId(1));
    }

    #[test]
    fn test_skips_open_circuit() {
        let ids = vec![EndpointId(1), EndpointId(2), EndpointId(3)];
        let stats = Arc::new(StatsTracker::with_endpoints(20, ids.clone()));
        for _ in 0..3 {
            stats.record_outcome(EndpointId(2), false, 10.0).unwrap();
        }
        let lb = RoundRobin::new(stats, 3);

        let picks: Vec<_> = (0..4).map(|_| lb.pick(&ids).unwrap()).collect();
        assert_eq!(picks, vec![EndpointId(1), EndpointId(3), EndpointId(3), EndpointId(1)]);
    }

    #[test]
    fn test_all_open_still_rotates() {
        let ids = vec![EndpointId(1), EndpointId(2)];
        let stats = Arc::new(StatsTracker::with_endpoints(20, ids.clone()));
        for id in &ids {
            for _ in 0..3 {
                stats.record_outcome(*id, false, 10.0).unwrap();
            }
        }
        let lb = RoundRobin::new(stats, 3);
        assert_eq!(lb.pick(&ids).unwrap(), EndpointId(1));
        assert_eq!(lb.pick(&ids).unwrap(), EndpointId(2));
    }

    #[test]
    fn test_empty_candidates() {
        let lb = RoundRobin::new(Arc::new(StatsTracker::default()), 3);
        assert!(matches!(lb.select(&[]), Err(BalancerError::Configuration(_))));
    }
}
