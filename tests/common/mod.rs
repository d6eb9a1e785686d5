//! Shared utilities for integration testing.

use std::collections::HashMap;
use std::sync::Mutex;

use endpoint_balancer::backend::{Backend, BackendError, CallOutcome};
use endpoint_balancer::EndpointId;

/// What a scripted endpoint does on a given call.
#[allow(dead_code)]
#[derive(Debug, Clone, Copy)]
pub enum Reply {
    Ok(f64),
    Fail(f64),
    Error,
    Hang,
    Panic,
}

/// Backend whose behaviour is a function of (endpoint, nth call to that endpoint).
pub struct ScriptedBackend<F> {
    script: F,
    calls: Mutex<HashMap<EndpointId, u64>>,
}

#[allow(dead_code)]
impl<F> ScriptedBackend<F>
where
    F: Fn(EndpointId, u64) -> Reply + Send + Sync,
{
    pub fn new(script: F) -> Self {
        Self {
            script,
            calls: Mutex::new(HashMap::new()),
        }
    }

    pub fn calls_to(&self, endpoint: EndpointId) -> u64 {
        self.calls.lock().unwrap().get(&endpoint).copied().unwrap_or(0)
    }

    fn next_reply(&self, endpoint: EndpointId) -> Reply {
        let mut calls = self.calls.lock().unwrap();
        let nth = calls.entry(endpoint).or_insert(0);
        let reply = (self.script)(endpoint, *nth);
        *nth += 1;
        reply
    }
}

impl<F> Backend for ScriptedBackend<F>
where
    F: Fn(EndpointId, u64) -> Reply + Send + Sync,
{
    async fn call(&self, endpoint: EndpointId) -> Result<CallOutcome, BackendError> {
        match self.next_reply(endpoint) {
            Reply::Ok(latency_ms) => Ok(CallOutcome::success(latency_ms)),
            Reply::Fail(latency_ms) => Ok(CallOutcome::failure(latency_ms)),
            Reply::Error => Err(BackendError::Transport("connection refused".into())),
            Reply::Hang => std::future::pending().await,
            Reply::Panic => panic!("scripted backend panic on {endpoint}"),
        }
    }
}

#[allow(dead_code)]
pub fn ids(raw: &[u32]) -> Vec<EndpointId> {
    raw.iter().copied().map(EndpointId).collect()
}
