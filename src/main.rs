//! Endpoint balancer driver.
//!
//! Runs the adaptive feedback loop against the simulated backend for a number
//! of iterations, then prints the backend summary, the loop report and the
//! final per-endpoint scores.
//!
//! ```text
//!  ┌──────────────┐   pick    ┌─────────────────┐  snapshot  ┌──────────────┐
//!  │ FeedbackLoop │──────────▶│ SelectionPolicy │───────────▶│ StatsTracker │
//!  └──────┬───────┘           └────────┬────────┘            └──────▲───────┘
//!         │ call (timeout)             │ score                      │
//!         ▼                            ▼                            │
//!  ┌──────────────┐            ┌──────────────┐    record outcome   │
//!  │   Backend    │            │    Scorer    │                     │
//!  └──────┬───────┘            └──────────────┘                     │
//!         └─────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use serde::Serialize;

use endpoint_balancer::backend::{BackendSummary, Scenario, SimulatedBackend};
use endpoint_balancer::config::{
    load_config, validate_config, BalancerConfig, ConfigError, PolicyKind,
};
use endpoint_balancer::lifecycle::Shutdown;
use endpoint_balancer::observability::{logging, metrics};
use endpoint_balancer::resilience::circuit_breaker::CircuitState;
use endpoint_balancer::{
    AdaptivePolicy, EndpointSnapshot, FeedbackLoop, LoopReport, RoundRobin, Scorer,
    SelectionPolicy, StatsTracker,
};

#[derive(Parser, Debug)]
#[command(name = "endpoint-balancer")]
#[command(about = "Adaptive endpoint selection against a simulated backend", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Total number of calls to issue.
    #[arg(short = 'n', long)]
    iterations: Option<u64>,

    /// Concurrent callers sharing one stats tracker.
    #[arg(short, long)]
    workers: Option<usize>,

    /// Simulated failure/latency scenario.
    #[arg(short, long, value_enum)]
    scenario: Option<Scenario>,

    /// Seed for both selection and simulation randomness.
    #[arg(long)]
    seed: Option<u64>,

    /// Selection policy.
    #[arg(short, long, value_enum)]
    policy: Option<PolicyKind>,

    /// Print the results as JSON.
    #[arg(long)]
    json: bool,

    /// Record metrics and print the Prometheus exposition after the run.
    #[arg(long)]
    metrics: bool,
}

impl Cli {
    fn apply(&self, config: &mut BalancerConfig) {
        if let Some(iterations) = self.iterations {
            config.feedback.iterations = iterations;
        }
        if let Some(workers) = self.workers {
            config.feedback.workers = workers;
        }
        if let Some(scenario) = self.scenario {
            config.simulation.scenario = scenario;
        }
        if let Some(seed) = self.seed {
            config.selection.seed = Some(seed);
            config.simulation.seed = Some(seed.wrapping_add(1));
        }
        if let Some(policy) = self.policy {
            config.selection.policy = policy;
        }
        if self.metrics {
            config.observability.metrics_enabled = true;
        }
    }
}

#[derive(Serialize)]
struct EndpointReport {
    #[serde(flatten)]
    snapshot: EndpointSnapshot,
    score: f64,
    circuit: CircuitState,
}

#[derive(Serialize)]
struct RunOutput<'a> {
    policy: &'a str,
    backend: &'a BackendSummary,
    report: &'a LoopReport,
    endpoints: &'a [EndpointReport],
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => BalancerConfig::default(),
    };
    cli.apply(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;

    logging::init(&config.observability.log_level);
    tracing::info!(
        endpoints = ?config.endpoints,
        scenario = %config.simulation.scenario,
        policy = ?config.selection.policy,
        iterations = config.feedback.iterations,
        workers = config.feedback.workers,
        "Configuration loaded"
    );

    let metrics_handle = if config.observability.metrics_enabled {
        Some(metrics::install_recorder()?)
    } else {
        None
    };

    let stats = Arc::new(StatsTracker::with_endpoints(
        config.stats.window_capacity,
        config.endpoints.iter().copied(),
    ));
    let scorer = Scorer::new(config.scoring.clone())?;
    let policy: Arc<dyn SelectionPolicy> = match config.selection.policy {
        PolicyKind::Adaptive => Arc::new(AdaptivePolicy::seeded(
            stats.clone(),
            scorer.clone(),
            config.selection.exploration_threshold,
            config.selection.seed,
        )?),
        PolicyKind::RoundRobin => Arc::new(RoundRobin::new(stats.clone(), scorer.trip_threshold())),
    };
    let policy_name = policy.name();

    let backend = Arc::new(
        SimulatedBackend::new(
            config.simulation.scenario,
            &config.endpoints,
            config.simulation.seed,
        )
        .with_time_scale(config.simulation.time_scale),
    );

    let shutdown = Shutdown::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal.trigger();
        }
    });

    let feedback = FeedbackLoop::new(
        stats.clone(),
        policy,
        backend.clone(),
        stats.endpoints(),
        Duration::from_millis(config.feedback.call_timeout_ms),
    )?
    .with_shutdown(shutdown.clone());

    let report = if config.feedback.workers > 1 {
        feedback
            .run_concurrent(config.feedback.iterations, config.feedback.workers)
            .await
    } else {
        feedback.run(config.feedback.iterations).await
    };
    if shutdown.is_triggered() {
        tracing::warn!(
            completed = report.iterations,
            requested = config.feedback.iterations,
            "Run interrupted before the iteration budget was spent"
        );
    }

    let summary = backend.summary();
    let endpoints: Vec<EndpointReport> = stats
        .snapshots()
        .into_iter()
        .map(|snapshot| EndpointReport {
            score: scorer.score(&snapshot),
            circuit: scorer.circuit_state(&snapshot),
            snapshot,
        })
        .collect();

    if cli.json {
        let output = RunOutput {
            policy: policy_name,
            backend: &summary,
            report: &report,
            endpoints: &endpoints,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("Policy: {policy_name}");
        println!("{summary}\n");
        println!("{report}\n");
        print_endpoints(&endpoints);
    }

    if let Some(handle) = metrics_handle {
        println!("\n{}", handle.render());
    }

    Ok(())
}

fn print_endpoints(endpoints: &[EndpointReport]) {
    println!(
        "{:<14} {:>7} {:>8} {:>12} {:>13} {:>8}",
        "endpoint", "score", "circuit", "recent ok", "recent lat", "streak"
    );
    for e in endpoints {
        let rate = e
            .snapshot
            .success_rate()
            .map_or_else(|| "-".to_string(), |r| format!("{:.0}%", r * 100.0));
        let latency = e
            .snapshot
            .mean_latency()
            .map_or_else(|| "-".to_string(), |ms| format!("{ms:.1} ms"));
        let circuit = if e.circuit.is_open() { "open" } else { "closed" };
        println!(
            "{:<14} {:>7.3} {:>8} {:>12} {:>13} {:>8}",
            e.snapshot.id.to_string(),
            e.score,
            circuit,
            rate,
            latency,
            e.snapshot.consecutive_failures
        );
    }
}
