//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap backend calls with a deadline
//! - Run each call on its own task so a panicking backend cannot take the
//!   caller down with it
//! - Abort the call task when the deadline passes
//! - Normalise every way a call can end into a recordable outcome
//!
//! Timed-out, errored and panicked calls become failures whose latency is the
//! timeout bound, so no call is ever left unrecorded.

use std::future::Future;
use std::time::Duration;

use crate::backend::{BackendError, CallOutcome};

/// How a guarded call ended.
#[derive(Debug, Clone, PartialEq)]
pub enum CallResult {
    Completed(CallOutcome),
    TransportError(BackendError),
    TimedOut,
}

impl CallResult {
    /// Outcome to record. Anything other than a well-formed completion is a
    /// failure at the timeout bound.
    pub fn into_outcome(self, timeout: Duration) -> CallOutcome {
        let bound_ms = duration_ms(timeout);
        match self {
            CallResult::Completed(outcome)
                if outcome.latency_ms.is_finite() && outcome.latency_ms >= 0.0 =>
            {
                outcome
            }
            CallResult::Completed(_) | CallResult::TransportError(_) | CallResult::TimedOut => {
                CallOutcome::failure(bound_ms)
            }
        }
    }
}

pub fn duration_ms(duration: Duration) -> f64 {
    duration.as_nanos() as f64 / 1_000_000.0
}

/// Run `call` on its own task, giving up after `timeout`.
pub async fn call_with_timeout<F>(timeout: Duration, call: F) -> CallResult
where
    F: Future<Output = Result<CallOutcome, BackendError>> + Send + 'static,
{
    let mut task = tokio::spawn(call);
    match tokio::time::timeout(timeout, &mut task).await {
        Ok(Ok(Ok(outcome))) => CallResult::Completed(outcome),
        Ok(Ok(Err(e))) => CallResult::TransportError(e),
        Ok(Err(join_error)) => {
            let reason = if join_error.is_panic() {
                "backend call panicked"
            } else {
                "backend call was cancelled"
            };
            CallResult::TransportError(BackendError::Transport(reason.to_string()))
        }
        Err(_) => {
            task.abort();
            CallResult::TimedOut
        }
    }
}
