//! The select → call → record loop.
//!
//! # Responsibilities
//! - Ask the policy for an endpoint
//! - Call the backend under a deadline
//! - Record every outcome, including timeouts and transport errors
//! - Spread iterations across a worker pool sharing one tracker
//!
//! # Design Decisions
//! - No backend failure ends the loop, a panic included; failures become
//!   recorded outcomes
//! - Workers claim iterations from one shared budget, so the total is exact
//! - Each worker subscribes to shutdown and checks it between iterations,
//!   never mid-call
//! - The trip threshold comes from the policy, so transition logs agree with
//!   how selection treats an endpoint

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;

use crate::backend::Backend;
use crate::error::{BalancerError, Result};
use crate::feedback::report::{CallEnd, LoopReport, StepRecord};
use crate::lifecycle::{triggered, Shutdown};
use crate::load_balancer::SelectionPolicy;
use crate::observability::metrics;
use crate::resilience::circuit_breaker::{CircuitState, Transition};
use crate::resilience::timeouts::{call_with_timeout, CallResult};
use crate::stats::{EndpointId, StatsTracker};

/// Drives calls through a selection policy and feeds outcomes back.
pub struct FeedbackLoop<B> {
    stats: Arc<StatsTracker>,
    policy: Arc<dyn SelectionPolicy>,
    backend: Arc<B>,
    candidates: Arc<[EndpointId]>,
    call_timeout: Duration,
    shutdown: Shutdown,
}

impl<B> Clone for FeedbackLoop<B> {
    fn clone(&self) -> Self {
        Self {
            stats: self.stats.clone(),
            policy: self.policy.clone(),
            backend: self.backend.clone(),
            candidates: self.candidates.clone(),
            call_timeout: self.call_timeout,
            shutdown: self.shutdown.clone(),
        }
    }
}

impl<B> fmt::Debug for FeedbackLoop<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeedbackLoop")
            .field("policy", &self.policy.name())
            .field("candidates", &self.candidates)
            .field("trip_threshold", &self.policy.trip_threshold())
            .field("call_timeout", &self.call_timeout)
            .finish_non_exhaustive()
    }
}

impl<B: Backend + 'static> FeedbackLoop<B> {
    /// Build a loop over `candidates`, all of which must already be registered.
    pub fn new(
        stats: Arc<StatsTracker>,
        policy: Arc<dyn SelectionPolicy>,
        backend: Arc<B>,
        candidates: Vec<EndpointId>,
        call_timeout: Duration,
    ) -> Result<Self> {
        if candidates.is_empty() {
            return Err(BalancerError::Configuration(
                "feedback loop needs at least one candidate endpoint".to_string(),
            ));
        }
        if let Some(unknown) = candidates.iter().find(|id| !stats.contains(**id)) {
            return Err(BalancerError::UnknownEndpoint(*unknown));
        }

        Ok(Self {
            stats,
            policy,
            backend,
            candidates: candidates.into(),
            call_timeout,
            shutdown: Shutdown::new(),
        })
    }

    /// Stop between iterations once `shutdown` is triggered.
    pub fn with_shutdown(mut self, shutdown: Shutdown) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn stats(&self) -> &Arc<StatsTracker> {
        &self.stats
    }

    pub fn candidates(&self) -> &[EndpointId] {
        &self.candidates
    }

    /// Run one iteration. `Err` only when no endpoint could be selected.
    pub async fn step(&self) -> Result<StepRecord> {
        let selection = self.policy.select(&self.candidates)?;
        let endpoint = selection.endpoint;

        let backend = self.backend.clone();
        let call = async move { backend.call(endpoint).await };
        let result = call_with_timeout(self.call_timeout, call).await;
        let call_end = match &result {
            CallResult::Completed(_) => CallEnd::Completed,
            CallResult::TransportError(e) => {
                tracing::debug!(endpoint = %endpoint, error = %e, "Backend call failed");
                CallEnd::TransportError
            }
            CallResult::TimedOut => {
                tracing::debug!(endpoint = %endpoint, timeout = ?self.call_timeout, "Backend call timed out");
                CallEnd::TimedOut
            }
        };
        let outcome = result.into_outcome(self.call_timeout);

        metrics::record_call(endpoint, outcome.success, outcome.latency_ms);
        let trip_threshold = self.policy.trip_threshold();
        let transition = match self.stats.record_outcome(endpoint, outcome.success, outcome.latency_ms) {
            Ok(recorded) => {
                let before = CircuitState::of(&recorded.previous, trip_threshold);
                let after = CircuitState::of(&recorded.current, trip_threshold);
                let transition = Transition::between(before, after);
                self.log_transition(endpoint, transition, recorded.current.consecutive_failures);
                transition
            }
            Err(e) => {
                tracing::error!(endpoint = %endpoint, error = %e, "Failed to record outcome");
                None
            }
        };

        tracing::trace!(
            endpoint = %endpoint,
            mode = selection.mode.as_str(),
            success = outcome.success,
            latency_ms = outcome.latency_ms,
            "Iteration complete"
        );

        Ok(StepRecord {
            endpoint,
            mode: selection.mode,
            outcome,
            call_end,
            transition,
        })
    }

    fn log_transition(&self, endpoint: EndpointId, transition: Option<Transition>, streak: u32) {
        match transition {
            Some(Transition::Tripped) => {
                tracing::warn!(endpoint = %endpoint, consecutive_failures = streak, "Circuit opened");
                metrics::record_circuit_state(endpoint, true);
            }
            Some(Transition::Recovered) => {
                tracing::info!(endpoint = %endpoint, "Circuit closed after successful call");
                metrics::record_circuit_state(endpoint, false);
            }
            None => {}
        }
    }

    async fn drain(&self, budget: &AtomicU64) -> LoopReport {
        let stop = self.shutdown.subscribe();
        let mut report = LoopReport::default();
        while !triggered(&stop) && claim(budget) {
            match self.step().await {
                Ok(step) => report.absorb(&step),
                Err(e) => {
                    tracing::error!(error = %e, "Endpoint selection failed");
                    report.selection_errors += 1;
                }
            }
        }
        report
    }

    /// Run `iterations` calls sequentially on the current task.
    pub async fn run(&self, iterations: u64) -> LoopReport {
        tracing::info!(policy = self.policy.name(), iterations, "Feedback loop starting");
        let budget = AtomicU64::new(iterations);
        let report = self.drain(&budget).await;
        tracing::info!(iterations = report.iterations, failures = report.failures, "Feedback loop finished");
        report
    }

    /// Run `iterations` calls across `workers` tasks sharing this loop's tracker.
    pub async fn run_concurrent(&self, iterations: u64, workers: usize) -> LoopReport {
        let workers = workers.max(1);
        tracing::info!(
            policy = self.policy.name(),
            iterations,
            workers,
            "Feedback loop starting"
        );

        let budget = Arc::new(AtomicU64::new(iterations));
        let mut set = JoinSet::new();
        for worker in 0..workers {
            let this = self.clone();
            let budget = budget.clone();
            set.spawn(async move {
                let report = this.drain(&budget).await;
                tracing::debug!(worker, iterations = report.iterations, "Worker finished");
                report
            });
        }

        let mut total = LoopReport::default();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(report) => total.merge(report),
                Err(e) => tracing::error!(error = %e, "Feedback worker terminated abnormally"),
            }
        }

        tracing::info!(iterations = total.iterations, failures = total.failures, "Feedback loop finished");
        total
    }
}

/// Take one iteration from the shared budget.
fn claim(budget: &AtomicU64) -> bool {
    budget
        .fetch_update(Ordering::AcqRel, Ordering::Acquire, |left| left.checked_sub(1))
        .is_ok()
}
