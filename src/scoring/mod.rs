//! Endpoint scoring.
//!
//! Turns an `EndpointSnapshot` into a single value in `[0, 1]`:
//!
//! ```text
//! circuit open            → 0.0
//! otherwise               → w_success * success_rate + w_latency * latency_score
//! latency_score           = clamp((ceiling - avg_latency) / ceiling, 0, 1)
//! empty history           → success_rate = latency_score = 1.0
//! ```
//!
//! `Scorer::new` rejects a non-positive or non-finite ceiling and weights that
//! are negative or do not sum to 1, so the score is never NaN and stays
//! monotonic in both factors.

use crate::config::{validate_scoring, ScoringConfig};
use crate::error::{BalancerError, Result};
use crate::resilience::circuit_breaker::CircuitState;
use crate::stats::EndpointSnapshot;

/// Stateless scoring function.
#[derive(Debug, Clone)]
pub struct Scorer {
    config: ScoringConfig,
}

impl Scorer {
    pub fn new(config: ScoringConfig) -> Result<Self> {
        let errors = validate_scoring(&config);
        if !errors.is_empty() {
            return Err(BalancerError::InvalidParameters(errors));
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn trip_threshold(&self) -> u32 {
        self.config.trip_threshold
    }

    pub fn circuit_state(&self, snapshot: &EndpointSnapshot) -> CircuitState {
        CircuitState::of(snapshot, self.config.trip_threshold)
    }

    /// Linear latency reward, 1.0 without history.
    pub fn latency_score(&self, snapshot: &EndpointSnapshot) -> f64 {
        let ceiling = self.config.latency_ceiling_ms;
        match snapshot.mean_latency() {
            Some(avg) => ((ceiling - avg) / ceiling).clamp(0.0, 1.0),
            None => 1.0,
        }
    }

    pub fn score(&self, snapshot: &EndpointSnapshot) -> f64 {
        if self.circuit_state(snapshot).is_open() {
            return 0.0;
        }

        let success_rate = snapshot.success_rate().unwrap_or(1.0);
        let latency_score = self.latency_score(snapshot);

        let score = self.config.success_weight * success_rate
            + self.config.latency_weight * latency_score;
        score.clamp(0.0, 1.0)
    }
}

impl Default for Scorer {
    fn default() -> Self {
        Self {
            config: ScoringConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ValidationError;
    use crate::stats::EndpointId;

    fn snapshot(samples: usize, successes: usize, avg_latency: f64) -> EndpointSnapshot {
        EndpointSnapshot {
            recent_samples: samples,
            recent_successes: successes,
            recent_latency_sum: avg_latency * samples as f64,
            total_successes: successes as u64,
            total_failures: (samples - successes) as u64,
            ..EndpointSnapshot::empty(EndpointId(1), 20)
        }
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_cold_start_scores_one() {
        let scorer = Scorer::default();
        let score = scorer.score(&EndpointSnapshot::empty(EndpointId(1), 20));
        assert_eq!(score, 1.0);
    }

    #[test]
    fn test_reference_examples() {
        let scorer = Scorer::default();
        let a = scorer.score(&snapshot(10, 10, 100.0));
        let b = scorer.score(&snapshot(10, 5, 50.0));
        assert!(approx(a, 0.8), "a = {a}");
        assert!(approx(b, 0.7), "b = {b}");
    }

    #[test]
    fn test_tripped_scores_zero() {
        let scorer = Scorer::default();
        let snap = EndpointSnapshot {
            consecutive_failures: 3,
            ..snapshot(10, 7, 10.0)
        };
        assert_eq!(scorer.score(&snap), 0.0);
    }

    #[test]
    fn test_latency_clamped() {
        let scorer = Scorer::default();
        assert_eq!(scorer.latency_score(&snapshot(4, 4, 900.0)), 0.0);
        assert_eq!(scorer.latency_score(&snapshot(4, 4, 0.0)), 1.0);
        assert!(approx(scorer.score(&snapshot(4, 4, 900.0)), 0.4));
    }

    #[test]
    fn test_custom_weights() {
        let scorer = Scorer::new(ScoringConfig {
            success_weight: 1.0,
            latency_weight: 0.0,
            ..ScoringConfig::default()
        })
        .unwrap();
        assert!(approx(scorer.score(&snapshot(4, 1, 5_000.0)), 0.25));
    }

    fn rejected(config: ScoringConfig) -> Vec<ValidationError> {
        match Scorer::new(config) {
            Err(BalancerError::InvalidParameters(errors)) => errors,
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn test_rejects_zero_ceiling() {
        let errors = rejected(ScoringConfig {
            latency_ceiling_ms: 0.0,
            ..ScoringConfig::default()
        });
        assert_eq!(errors, vec![ValidationError::LatencyCeiling(0.0)]);
    }

    #[test]
    fn test_rejects_non_finite_ceiling() {
        let errors = rejected(ScoringConfig {
            latency_ceiling_ms: f64::NAN,
            ..ScoringConfig::default()
        });
        assert!(matches!(errors[..], [ValidationError::LatencyCeiling(c)] if c.is_nan()));
    }

    #[test]
    fn test_rejects_bad_weights() {
        let negative = rejected(ScoringConfig {
            success_weight: -0.5,
            latency_weight: 1.5,
            ..ScoringConfig::default()
        });
        assert!(matches!(negative[..], [ValidationError::NegativeWeight { .. }]));

        let nan = rejected(ScoringConfig {
            success_weight: f64::NAN,
            ..ScoringConfig::default()
        });
        assert!(matches!(nan[..], [ValidationError::NegativeWeight { .. }]));

        let unbalanced = rejected(ScoringConfig {
            success_weight: 0.7,
            latency_weight: 0.7,
            ..ScoringConfig::default()
        });
        assert!(matches!(unbalanced[..], [ValidationError::WeightSum(_)]));
    }

    #[test]
    fn test_rejects_zero_trip_threshold() {
        let errors = rejected(ScoringConfig {
            trip_threshold: 0,
            ..ScoringConfig::default()
        });
        assert_eq!(errors, vec![ValidationError::ZeroTripThreshold]);
    }

    #[test]
    fn test_zero_latency_scores_finite() {
        let scorer = Scorer::new(ScoringConfig {
            latency_ceiling_ms: 1.0,
            ..ScoringConfig::default()
        })
        .unwrap();
        let score = scorer.score(&snapshot(5, 5, 0.0));
        assert_eq!(score, 1.0);
    }
}
