//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (capacities, thresholds, weights, timeouts)
//! - Detect duplicate endpoint ids
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: BalancerConfig → Result<(), Vec<ValidationError>>

use std::collections::HashSet;

use thiserror::Error;

use crate::config::schema::{BalancerConfig, ScoringConfig};
use crate::stats::EndpointId;

/// Tolerance when checking that scoring weights sum to one.
const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("at least one endpoint must be configured")]
    NoEndpoints,

    #[error("endpoint {0} is listed more than once")]
    DuplicateEndpoint(EndpointId),

    #[error("stats.window_capacity must be at least 1")]
    ZeroWindow,

    #[error("scoring.trip_threshold must be at least 1")]
    ZeroTripThreshold,

    #[error("scoring.latency_ceiling_ms must be a positive number, got {0}")]
    LatencyCeiling(f64),

    #[error("scoring weights must be finite and non-negative, got success={success} latency={latency}")]
    NegativeWeight { success: f64, latency: f64 },

    #[error("scoring weights must sum to 1.0, got {0}")]
    WeightSum(f64),

    #[error("selection.exploration_threshold must be within [0, 1], got {0}")]
    ExplorationThreshold(f64),

    #[error("feedback.workers must be at least 1")]
    ZeroWorkers,

    #[error("feedback.call_timeout_ms must be at least 1")]
    ZeroTimeout,

    #[error("simulation.time_scale must be finite and non-negative, got {0}")]
    TimeScale(f64),
}

pub fn validate_config(config: &BalancerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.endpoints.is_empty() {
        errors.push(ValidationError::NoEndpoints);
    }
    let mut seen = HashSet::new();
    for id in &config.endpoints {
        if !seen.insert(*id) {
            errors.push(ValidationError::DuplicateEndpoint(*id));
        }
    }

    if config.stats.window_capacity == 0 {
        errors.push(ValidationError::ZeroWindow);
    }

    errors.extend(validate_scoring(&config.scoring));
    errors.extend(validate_exploration_threshold(
        config.selection.exploration_threshold,
    ));

    if config.feedback.workers == 0 {
        errors.push(ValidationError::ZeroWorkers);
    }
    if config.feedback.call_timeout_ms == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    let time_scale = config.simulation.time_scale;
    if !time_scale.is_finite() || time_scale < 0.0 {
        errors.push(ValidationError::TimeScale(time_scale));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Checks shared by `validate_config` and `Scorer::new`.
pub fn validate_scoring(scoring: &ScoringConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if scoring.trip_threshold == 0 {
        errors.push(ValidationError::ZeroTripThreshold);
    }
    if !scoring.latency_ceiling_ms.is_finite() || scoring.latency_ceiling_ms <= 0.0 {
        errors.push(ValidationError::LatencyCeiling(scoring.latency_ceiling_ms));
    }

    let weights = [scoring.success_weight, scoring.latency_weight];
    if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
        errors.push(ValidationError::NegativeWeight {
            success: scoring.success_weight,
            latency: scoring.latency_weight,
        });
    } else {
        let sum = scoring.success_weight + scoring.latency_weight;
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            errors.push(ValidationError::WeightSum(sum));
        }
    }

    errors
}

/// NaN fails the range check too.
pub fn validate_exploration_threshold(threshold: f64) -> Option<ValidationError> {
    if (0.0..=1.0).contains(&threshold) {
        None
    } else {
        Some(ValidationError::ExplorationThreshold(threshold))
    }
}

pub(crate) fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
