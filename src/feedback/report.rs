//! Per-run accounting for the feedback loop.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::backend::CallOutcome;
use crate::load_balancer::SelectionMode;
use crate::resilience::circuit_breaker::Transition;
use crate::stats::EndpointId;

/// How the backend call of one iteration ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CallEnd {
    Completed,
    TransportError,
    TimedOut,
}

/// Everything observed in one select → call → record iteration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepRecord {
    pub endpoint: EndpointId,
    pub mode: SelectionMode,
    pub outcome: CallOutcome,
    pub call_end: CallEnd,
    pub transition: Option<Transition>,
}

/// Aggregate of every iteration a loop (or one worker) ran.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoopReport {
    pub iterations: u64,
    pub successes: u64,
    pub failures: u64,
    pub explorations: u64,
    pub timeouts: u64,
    pub transport_errors: u64,
    pub circuit_trips: u64,
    pub circuit_recoveries: u64,
    /// Iterations that could not select an endpoint.
    pub selection_errors: u64,
    pub selections: BTreeMap<EndpointId, u64>,
}

impl LoopReport {
    pub fn absorb(&mut self, step: &StepRecord) {
        self.iterations += 1;
        if step.outcome.success {
            self.successes += 1;
        } else {
            self.failures += 1;
        }
        if step.mode == SelectionMode::Explore {
            self.explorations += 1;
        }
        match step.call_end {
            CallEnd::Completed => {}
            CallEnd::TransportError => self.transport_errors += 1,
            CallEnd::TimedOut => self.timeouts += 1,
        }
        match step.transition {
            Some(Transition::Tripped) => self.circuit_trips += 1,
            Some(Transition::Recovered) => self.circuit_recoveries += 1,
            None => {}
        }
        *self.selections.entry(step.endpoint).or_insert(0) += 1;
    }

    pub fn merge(&mut self, other: LoopReport) {
        self.iterations += other.iterations;
        self.successes += other.successes;
        self.failures += other.failures;
        self.explorations += other.explorations;
        self.timeouts += other.timeouts;
        self.transport_errors += other.transport_errors;
        self.circuit_trips += other.circuit_trips;
        self.circuit_recoveries += other.circuit_recoveries;
        self.selection_errors += other.selection_errors;
        for (endpoint, count) in other.selections {
            *self.selections.entry(endpoint).or_insert(0) += count;
        }
    }
}

impl fmt::Display for LoopReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Iterations: {} ({} ok, {} failed)",
            self.iterations, self.successes, self.failures
        )?;
        writeln!(
            f,
            "Explorations: {}  Timeouts: {}  Transport errors: {}",
            self.explorations, self.timeouts, self.transport_errors
        )?;
        write!(
            f,
            "Circuit trips: {}  Recoveries: {}",
            self.circuit_trips, self.circuit_recoveries
        )?;
        if self.selection_errors > 0 {
            write!(f, "\nSelection errors: {}", self.selection_errors)?;
        }
        Ok(())
    }
}
