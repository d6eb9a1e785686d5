//! Score-driven selection with a uniform exploration fallback.
//!
//! The best-scoring candidate wins, ties going to the lowest id. When even the
//! best score is under `exploration_threshold`, every score is ignored and a
//! candidate is drawn uniformly from the full set, open circuits included, so a
//! tripped endpoint always keeps a path back into rotation.

use std::fmt;
use std::sync::{Arc, Mutex};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::validate_exploration_threshold;
use crate::error::{BalancerError, Result};
use crate::load_balancer::{Selection, SelectionMode, SelectionPolicy};
use crate::observability::metrics;
use crate::scoring::Scorer;
use crate::stats::{EndpointId, StatsTracker};

/// Default best-score floor under which selection explores.
pub const DEFAULT_EXPLORATION_THRESHOLD: f64 = 0.2;

pub struct AdaptivePolicy<R = StdRng> {
    stats: Arc<StatsTracker>,
    scorer: Scorer,
    exploration_threshold: f64,
    rng: Mutex<R>,
}

impl AdaptivePolicy<StdRng> {
    /// Build a policy backed by `StdRng`, seeded when `seed` is given.
    pub fn seeded(
        stats: Arc<StatsTracker>,
        scorer: Scorer,
        exploration_threshold: f64,
        seed: Option<u64>,
    ) -> Result<Self> {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::new(stats, scorer, exploration_threshold, rng)
    }
}

impl<R: Rng + Send> AdaptivePolicy<R> {
    /// Fails unless `exploration_threshold` lies in `[0, 1]`.
    pub fn new(
        stats: Arc<StatsTracker>,
        scorer: Scorer,
        exploration_threshold: f64,
        rng: R,
    ) -> Result<Self> {
        if let Some(error) = validate_exploration_threshold(exploration_threshold) {
            return Err(BalancerError::InvalidParameters(vec![error]));
        }
        Ok(Self {
            stats,
            scorer,
            exploration_threshold,
            rng: Mutex::new(rng),
        })
    }

    pub fn scorer(&self) -> &Scorer {
        &self.scorer
    }

    pub fn exploration_threshold(&self) -> f64 {
        self.exploration_threshold
    }

    /// Current score of every candidate, in candidate order.
    pub fn scores(&self, candidates: &[EndpointId]) -> Result<Vec<(EndpointId, f64)>> {
        candidates
            .iter()
            .map(|&id| {
                let snapshot = self.stats.snapshot(id)?;
                Ok((id, self.scorer.score(&snapshot)))
            })
            .collect()
    }

    fn explore(&self, candidates: &[EndpointId]) -> EndpointId {
        let mut rng = self.rng.lock().expect("exploration rng mutex poisoned");
        candidates[rng.gen_range(0..candidates.len())]
    }
}

impl<R: Rng + Send> SelectionPolicy for AdaptivePolicy<R> {
    fn select(&self, candidates: &[EndpointId]) -> Result<Selection> {
        if candidates.is_empty() {
            return Err(BalancerError::Configuration(
                "no candidate endpoints to select from".to_string(),
            ));
        }

        let mut best: Option<(EndpointId, f64)> = None;
        for (id, score) in self.scores(candidates)? {
            metrics::record_score(id, score);
            best = match best {
                Some((best_id, best_score))
                    if best_score > score || (best_score == score && best_id < id) =>
                {
                    Some((best_id, best_score))
                }
                _ => Some((id, score)),
            };
        }
        let (best_id, best_score) = best.ok_or_else(|| {
            BalancerError::Configuration("no candidate endpoints to select from".to_string())
        })?;

        let selection = if best_score < self.exploration_threshold {
            let endpoint = self.explore(candidates);
            tracing::debug!(
                best = %best_id,
                best_score,
                chosen = %endpoint,
                "All candidates below exploration threshold, exploring"
            );
            Selection {
                endpoint,
                mode: SelectionMode::Explore,
                best_score: Some(best_score),
            }
        } else {
            Selection {
                endpoint: best_id,
                mode: SelectionMode::Exploit,
                best_score: Some(best_score),
            }
        };

        metrics::record_selection(selection.endpoint, selection.mode);
        Ok(selection)
    }

    fn trip_threshold(&self) -> u32 {
        self.scorer.trip_threshold()
    }

    fn name(&self) -> &'static str {
        "adaptive"
    }
}

impl<R> fmt::Debug for AdaptivePolicy<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdaptivePolicy")
            .field("endpoints", &self.stats.endpoints())
            .field("scorer", &self.scorer)
            .field("exploration_threshold", &self.exploration_threshold)
            .finish_non_exhaustive()
    }
}
