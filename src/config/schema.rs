//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the balancer.
//! All types derive Serde traits for deserialization from config files.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::backend::simulated::Scenario;
use crate::resilience::circuit_breaker::DEFAULT_TRIP_THRESHOLD;
use crate::stats::{EndpointId, DEFAULT_WINDOW_CAPACITY};

/// Root configuration for the endpoint balancer.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BalancerConfig {
    /// Endpoints registered at startup.
    pub endpoints: Vec<EndpointId>,

    /// Rolling history settings.
    pub stats: StatsConfig,

    /// Scoring function parameters.
    pub scoring: ScoringConfig,

    /// Selection policy settings.
    pub selection: SelectionConfig,

    /// Feedback loop settings.
    pub feedback: FeedbackConfig,

    /// Simulated backend settings.
    pub simulation: SimulationConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for BalancerConfig {
    fn default() -> Self {
        Self {
            endpoints: vec![EndpointId(1), EndpointId(2), EndpointId(3)],
            stats: StatsConfig::default(),
            scoring: ScoringConfig::default(),
            selection: SelectionConfig::default(),
            feedback: FeedbackConfig::default(),
            simulation: SimulationConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Rolling history configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StatsConfig {
    /// Number of recent outcomes kept per endpoint.
    pub window_capacity: usize,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            window_capacity: DEFAULT_WINDOW_CAPACITY,
        }
    }
}

/// Scoring function configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Consecutive failures that force the score to zero.
    pub trip_threshold: u32,

    /// Average latency (ms) at or above which the latency factor is zero.
    pub latency_ceiling_ms: f64,

    /// Weight of the recent success rate.
    pub success_weight: f64,

    /// Weight of the latency factor.
    pub latency_weight: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            trip_threshold: DEFAULT_TRIP_THRESHOLD,
            latency_ceiling_ms: 300.0,
            success_weight: 0.4,
            latency_weight: 0.6,
        }
    }
}

/// Which selection policy drives the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    #[default]
    Adaptive,
    RoundRobin,
}

/// Selection policy configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SelectionConfig {
    pub policy: PolicyKind,

    /// Best score below which selection falls back to uniform exploration.
    pub exploration_threshold: f64,

    /// Seed for the exploration RNG. Random when unset.
    pub seed: Option<u64>,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            policy: PolicyKind::Adaptive,
            exploration_threshold: 0.2,
            seed: None,
        }
    }
}

/// Feedback loop configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FeedbackConfig {
    /// Total calls issued across all workers.
    pub iterations: u64,

    /// Concurrent callers sharing one stats tracker.
    pub workers: usize,

    /// Deadline for a single backend call in milliseconds.
    pub call_timeout_ms: u64,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            iterations: 1_000,
            workers: 1,
            call_timeout_ms: 1_000,
        }
    }
}

/// Simulated backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub scenario: Scenario,

    /// Seed for simulated outcomes. Random when unset.
    pub seed: Option<u64>,

    /// Real sleep per simulated millisecond (0 disables sleeping).
    pub time_scale: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            scenario: Scenario::Steady,
            seed: None,
            time_scale: 0.0,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Install the Prometheus recorder and print the exposition after the run.
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
        }
    }
}
