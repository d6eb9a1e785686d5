//! Scenario-driven simulated backend.
//!
//! # Responsibilities
//! - Produce success/failure and latency per endpoint from a seeded RNG
//! - Model outages, latency drift and hung calls per scenario
//! - Keep per-endpoint tallies for the end-of-run summary
//!
//! Outage windows are expressed in backend-wide call numbers, so a run of N
//! iterations sees the same failure schedule regardless of routing.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::ops::Range;
use std::sync::Mutex;
use std::time::Duration;

use clap::ValueEnum;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::backend::{Backend, BackendError, CallOutcome};
use crate::stats::EndpointId;

/// Induced failure and latency profile selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    /// Fixed profiles with distinct reliability/latency trade-offs.
    #[default]
    Steady,
    /// The fastest endpoint fails hard for a window of calls, then recovers.
    Outage,
    /// The fastest endpoint slows down with every call it serves.
    Degrading,
    /// The fastest endpoint hangs on a share of calls.
    Flaky,
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Scenario::Steady => "steady",
            Scenario::Outage => "outage",
            Scenario::Degrading => "degrading",
            Scenario::Flaky => "flaky",
        };
        f.write_str(name)
    }
}

impl Scenario {
    /// Profiles assigned by position in the ascending id list. Endpoints past
    /// the scenario's profiles get `EndpointProfile::default()`.
    pub fn profiles(self, endpoints: &[EndpointId]) -> HashMap<EndpointId, EndpointProfile> {
        let shaped = match self {
            Scenario::Steady => vec![
                EndpointProfile::new(0.95, 120.0, 30.0),
                EndpointProfile::new(0.80, 60.0, 20.0),
                EndpointProfile::new(0.99, 250.0, 40.0),
            ],
            Scenario::Outage => vec![
                EndpointProfile {
                    outages: vec![200..500],
                    ..EndpointProfile::new(0.97, 80.0, 20.0)
                },
                EndpointProfile::new(0.90, 150.0, 30.0),
                EndpointProfile::new(0.90, 200.0, 30.0),
            ],
            Scenario::Degrading => vec![
                EndpointProfile {
                    latency_drift_ms: 0.5,
                    ..EndpointProfile::new(0.98, 40.0, 10.0)
                },
                EndpointProfile::new(0.95, 120.0, 20.0),
                EndpointProfile::new(0.90, 180.0, 30.0),
            ],
            Scenario::Flaky => vec![
                EndpointProfile {
                    hang_rate: 0.25,
                    ..EndpointProfile::new(0.99, 50.0, 10.0)
                },
                EndpointProfile::new(0.95, 110.0, 20.0),
                EndpointProfile::new(0.90, 160.0, 30.0),
            ],
        };

        let mut sorted = endpoints.to_vec();
        sorted.sort_unstable();
        sorted.dedup();

        let mut shaped = shaped.into_iter();
        sorted
            .into_iter()
            .map(|id| (id, shaped.next().unwrap_or_default()))
            .collect()
    }
}

/// Behaviour of one simulated endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointProfile {
    /// Probability that a responding call succeeds.
    pub success_rate: f64,
    /// Base latency in milliseconds.
    pub latency_ms: f64,
    /// Uniform jitter applied around the base latency.
    pub jitter_ms: f64,
    /// Probability that a call never completes.
    pub hang_rate: f64,
    /// Backend-wide call numbers during which every call fails.
    pub outages: Vec<Range<u64>>,
    /// Latency added for every call this endpoint has already served.
    pub latency_drift_ms: f64,
}

impl EndpointProfile {
    pub fn new(success_rate: f64, latency_ms: f64, jitter_ms: f64) -> Self {
        Self {
            success_rate,
            latency_ms,
            jitter_ms,
            hang_rate: 0.0,
            outages: Vec::new(),
            latency_drift_ms: 0.0,
        }
    }

    fn in_outage(&self, call_number: u64) -> bool {
        self.outages.iter().any(|window| window.contains(&call_number))
    }
}

impl Default for EndpointProfile {
    fn default() -> Self {
        Self::new(0.90, 150.0, 30.0)
    }
}

/// Per-endpoint tallies.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EndpointSummary {
    pub endpoint: EndpointId,
    pub calls: u64,
    pub successes: u64,
    pub failures: u64,
    pub hangs: u64,
    /// Mean latency of calls that responded.
    pub average_latency_ms: Option<f64>,
}

/// Aggregate report requested by the driver after a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BackendSummary {
    pub scenario: String,
    pub endpoints: Vec<EndpointSummary>,
    pub total_calls: u64,
    pub total_successes: u64,
    pub total_failures: u64,
    pub total_hangs: u64,
    pub average_latency_ms: Option<f64>,
}

impl BackendSummary {
    pub fn success_ratio(&self) -> f64 {
        let responded = self.total_successes + self.total_failures;
        if responded == 0 {
            0.0
        } else {
            self.total_successes as f64 / responded as f64
        }
    }
}

impl fmt::Display for BackendSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Scenario: {}", self.scenario)?;
        writeln!(
            f,
            "{:<14} {:>8} {:>10} {:>10} {:>7} {:>14}",
            "endpoint", "calls", "successes", "failures", "hangs", "avg latency"
        )?;
        for e in &self.endpoints {
            writeln!(
                f,
                "{:<14} {:>8} {:>10} {:>10} {:>7} {:>14}",
                e.endpoint.to_string(),
                e.calls,
                e.successes,
                e.failures,
                e.hangs,
                format_latency(e.average_latency_ms)
            )?;
        }
        writeln!(
            f,
            "{:<14} {:>8} {:>10} {:>10} {:>7} {:>14}",
            "total",
            self.total_calls,
            self.total_successes,
            self.total_failures,
            self.total_hangs,
            format_latency(self.average_latency_ms)
        )?;
        write!(f, "Success ratio: {:.2}%", self.success_ratio() * 100.0)
    }
}

fn format_latency(latency: Option<f64>) -> String {
    latency.map_or_else(|| "-".to_string(), |ms| format!("{ms:.1} ms"))
}

#[derive(Debug, Default)]
struct Tally {
    calls: u64,
    successes: u64,
    failures: u64,
    hangs: u64,
    latency_sum: f64,
}

#[derive(Debug)]
struct SimState {
    rng: StdRng,
    calls: u64,
    served: HashMap<EndpointId, u64>,
    tallies: BTreeMap<EndpointId, Tally>,
}

enum Planned {
    Respond(CallOutcome),
    Hang,
}

/// Simulated backend serving a fixed set of endpoints.
#[derive(Debug)]
pub struct SimulatedBackend {
    scenario: Scenario,
    profiles: HashMap<EndpointId, EndpointProfile>,
    time_scale: f64,
    state: Mutex<SimState>,
}

impl SimulatedBackend {
    /// Build a backend for `scenario` over `endpoints`.
    pub fn new(scenario: Scenario, endpoints: &[EndpointId], seed: Option<u64>) -> Self {
        Self::with_profiles(scenario, scenario.profiles(endpoints), seed)
    }

    /// Build a backend from explicit profiles.
    pub fn with_profiles(
        scenario: Scenario,
        profiles: HashMap<EndpointId, EndpointProfile>,
        seed: Option<u64>,
    ) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let tallies = profiles.keys().map(|id| (*id, Tally::default())).collect();
        Self {
            scenario,
            profiles,
            time_scale: 0.0,
            state: Mutex::new(SimState {
                rng,
                calls: 0,
                served: HashMap::new(),
                tallies,
            }),
        }
    }

    /// Sleep `latency_ms * time_scale` real milliseconds per responding call.
    pub fn with_time_scale(mut self, time_scale: f64) -> Self {
        self.time_scale = time_scale.max(0.0);
        self
    }

    pub fn scenario(&self) -> Scenario {
        self.scenario
    }

    pub fn profile(&self, endpoint: EndpointId) -> Option<&EndpointProfile> {
        self.profiles.get(&endpoint)
    }

    fn plan(&self, endpoint: EndpointId) -> Result<Planned, BackendError> {
        let profile = self
            .profiles
            .get(&endpoint)
            .ok_or(BackendError::Unavailable(endpoint))?;

        let mut state = self.state.lock().expect("simulated backend mutex poisoned");
        let call_number = state.calls;
        state.calls += 1;
        let served = {
            let served = state.served.entry(endpoint).or_insert(0);
            *served += 1;
            *served - 1
        };

        let hang = profile.hang_rate > 0.0 && state.rng.gen_bool(profile.hang_rate.min(1.0));
        let success = !profile.in_outage(call_number)
            && state.rng.gen_bool(profile.success_rate.clamp(0.0, 1.0));
        let jitter = if profile.jitter_ms > 0.0 {
            state.rng.gen_range(-profile.jitter_ms..=profile.jitter_ms)
        } else {
            0.0
        };
        let latency_ms =
            (profile.latency_ms + profile.latency_drift_ms * served as f64 + jitter).max(1.0);

        let tally = state.tallies.entry(endpoint).or_default();
        tally.calls += 1;
        if hang {
            tally.hangs += 1;
            return Ok(Planned::Hang);
        }
        if success {
            tally.successes += 1;
        } else {
            tally.failures += 1;
        }
        tally.latency_sum += latency_ms;

        Ok(Planned::Respond(CallOutcome {
            success,
            latency_ms,
        }))
    }

    /// Aggregate counts and average latency so far.
    pub fn summary(&self) -> BackendSummary {
        let state = self.state.lock().expect("simulated backend mutex poisoned");
        let mut summary = BackendSummary {
            scenario: self.scenario.to_string(),
            ..BackendSummary::default()
        };
        let mut latency_sum = 0.0;

        for (endpoint, tally) in &state.tallies {
            let responded = tally.successes + tally.failures;
            summary.endpoints.push(EndpointSummary {
                endpoint: *endpoint,
                calls: tally.calls,
                successes: tally.successes,
                failures: tally.failures,
                hangs: tally.hangs,
                average_latency_ms: (responded > 0).then(|| tally.latency_sum / responded as f64),
            });
            summary.total_calls += tally.calls;
            summary.total_successes += tally.successes;
            summary.total_failures += tally.failures;
            summary.total_hangs += tally.hangs;
            latency_sum += tally.latency_sum;
        }

        let responded = summary.total_successes + summary.total_failures;
        summary.average_latency_ms = (responded > 0).then(|| latency_sum / responded as f64);
        summary
    }
}

impl Backend for SimulatedBackend {
    async fn call(&self, endpoint: EndpointId) -> Result<CallOutcome, BackendError> {
        match self.plan(endpoint)? {
            Planned::Hang => std::future::pending().await,
            Planned::Respond(outcome) => {
                if self.time_scale > 0.0 {
                    let delay = Duration::from_secs_f64(outcome.latency_ms * self.time_scale / 1_000.0);
                    tokio::time::sleep(delay).await;
                }
                Ok(outcome)
            }
        }
    }
}
