//! Integration tests for the select → call → record loop.

use std::sync::Arc;
use std::time::Duration;

use endpoint_balancer::config::ScoringConfig;
use endpoint_balancer::lifecycle::Shutdown;
use endpoint_balancer::{
    AdaptivePolicy, BalancerError, EndpointId, FeedbackLoop, RoundRobin, Scorer, SelectionPolicy,
    StatsTracker,
};

mod common;
use common::{ids, Reply, ScriptedBackend};

const TIMEOUT: Duration = Duration::from_millis(200);

fn adaptive(stats: &Arc<StatsTracker>, seed: u64) -> Arc<dyn SelectionPolicy> {
    Arc::new(AdaptivePolicy::seeded(stats.clone(), Scorer::default(), 0.2, Some(seed)).unwrap())
}

fn build<F>(
    endpoints: &[u32],
    seed: u64,
    script: F,
) -> (Arc<StatsTracker>, Arc<ScriptedBackend<F>>, FeedbackLoop<ScriptedBackend<F>>)
where
    F: Fn(EndpointId, u64) -> Reply + Send + Sync + 'static,
{
    let stats = Arc::new(StatsTracker::with_endpoints(20, ids(endpoints)));
    let backend = Arc::new(ScriptedBackend::new(script));
    let feedback = FeedbackLoop::new(
        stats.clone(),
        adaptive(&stats, seed),
        backend.clone(),
        ids(endpoints),
        TIMEOUT,
    )
    .unwrap();
    (stats, backend, feedback)
}

fn total_recorded(stats: &StatsTracker) -> u64 {
    stats.snapshots().iter().map(|s| s.total_calls()).sum()
}

#[tokio::test]
async fn test_records_every_iteration() {
    let (stats, _, feedback) = build(&[1, 2, 3], 1, |_, _| Reply::Ok(50.0));

    let report = feedback.run(100).await;

    assert_eq!(report.iterations, 100);
    assert_eq!(report.successes, 100);
    assert_eq!(total_recorded(&stats), 100);
}

#[tokio::test]
async fn test_steers_toward_faster_endpoint() {
    let (_, backend, feedback) = build(&[1, 2], 1, |id, _| {
        if id == EndpointId(1) {
            Reply::Ok(20.0)
        } else {
            Reply::Ok(250.0)
        }
    });

    let report = feedback.run(200).await;

    // Endpoint 2 is tried once while still cold, then loses on latency.
    assert_eq!(backend.calls_to(EndpointId(2)), 1);
    assert_eq!(report.selections[&EndpointId(1)], 199);
    assert_eq!(report.explorations, 0);
}

#[tokio::test]
async fn test_survives_backend_that_always_errors() {
    let (stats, _, feedback) = build(&[1, 2, 3], 9, |_, _| Reply::Error);

    let report = feedback.run(60).await;

    assert_eq!(report.iterations, 60);
    assert_eq!(report.failures, 60);
    assert_eq!(report.transport_errors, 60);
    assert_eq!(total_recorded(&stats), 60);
    for snapshot in stats.snapshots() {
        assert!(snapshot.total_calls() > 0, "{} was starved", snapshot.id);
        assert_eq!(snapshot.mean_latency(), Some(200.0));
    }
}

#[tokio::test(start_paused = true)]
async fn test_hung_calls_recorded_at_timeout() {
    let (stats, backend, feedback) = build(&[1, 2], 3, |id, _| {
        if id == EndpointId(1) {
            Reply::Hang
        } else {
            Reply::Ok(40.0)
        }
    });

    let report = feedback.run(50).await;

    assert_eq!(report.iterations, 50);
    let hung = stats.snapshot(EndpointId(1)).unwrap();
    assert_eq!(hung.total_calls(), backend.calls_to(EndpointId(1)));
    assert_eq!(report.timeouts, hung.total_calls());
    assert_eq!(hung.total_successes, 0);
    assert_eq!(hung.mean_latency(), Some(200.0));
}

#[tokio::test(start_paused = true)]
async fn test_survives_backend_that_always_hangs() {
    let (stats, _, feedback) = build(&[1, 2, 3], 4, |_, _| Reply::Hang);

    let report = feedback.run(30).await;

    assert_eq!(report.iterations, 30);
    assert_eq!(report.timeouts, 30);
    assert_eq!(report.failures, 30);
    assert_eq!(total_recorded(&stats), 30);
    for snapshot in stats.snapshots() {
        assert_eq!(snapshot.total_successes, 0);
        assert_eq!(snapshot.mean_latency(), Some(200.0));
    }
}

#[tokio::test]
async fn test_panicking_backend_recorded_as_failure() {
    let (stats, backend, feedback) = build(&[1, 2], 2, |id, _| {
        if id == EndpointId(1) {
            Reply::Panic
        } else {
            Reply::Ok(30.0)
        }
    });

    let report = feedback.run(40).await;

    assert_eq!(report.iterations, 40);
    assert_eq!(total_recorded(&stats), 40);
    let broken = stats.snapshot(EndpointId(1)).unwrap();
    assert_eq!(broken.total_calls(), backend.calls_to(EndpointId(1)));
    assert_eq!(broken.total_successes, 0);
    assert_eq!(broken.mean_latency(), Some(200.0));
    assert_eq!(report.transport_errors, broken.total_calls());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_panicking_backend_does_not_kill_workers() {
    let (stats, _, feedback) = build(&[1, 2], 8, |id, nth| {
        if id == EndpointId(1) || nth % 3 == 0 {
            Reply::Panic
        } else {
            Reply::Ok(30.0)
        }
    });

    let report = feedback.run_concurrent(50, 2).await;

    assert_eq!(report.iterations, 50);
    assert_eq!(report.successes + report.failures, 50);
    assert_eq!(total_recorded(&stats), 50);
    assert!(report.transport_errors >= 1);
}

#[tokio::test]
async fn test_transitions_use_policy_threshold() {
    let stats = Arc::new(StatsTracker::with_endpoints(20, ids(&[1])));
    let backend = Arc::new(ScriptedBackend::new(|_: EndpointId, _: u64| Reply::Fail(10.0)));
    let policy: Arc<dyn SelectionPolicy> = Arc::new(RoundRobin::new(stats.clone(), 5));
    let feedback = FeedbackLoop::new(stats.clone(), policy, backend, ids(&[1]), TIMEOUT).unwrap();

    assert_eq!(feedback.run(4).await.circuit_trips, 0);
    assert_eq!(feedback.run(1).await.circuit_trips, 1);

    let scorer = Scorer::new(ScoringConfig {
        trip_threshold: 5,
        ..ScoringConfig::default()
    })
    .unwrap();
    assert!(scorer.circuit_state(&stats.snapshot(EndpointId(1)).unwrap()).is_open());
}

#[tokio::test]
async fn test_tripped_endpoint_recovers_through_exploration() {
    // Endpoint 1 fails its first three calls, then is healthy. Endpoint 2 never works.
    let (stats, _, feedback) = build(&[1, 2], 5, |id, nth| {
        if id == EndpointId(1) && nth >= 3 {
            Reply::Ok(10.0)
        } else {
            Reply::Fail(10.0)
        }
    });

    let report = feedback.run(200).await;

    assert_eq!(report.circuit_trips, 2);
    assert_eq!(report.circuit_recoveries, 1);
    assert!(report.explorations >= 1);

    let recovered = stats.snapshot(EndpointId(1)).unwrap();
    assert_eq!(recovered.consecutive_failures, 0);
    assert!(recovered.total_successes > 150);
    assert!(Scorer::default().score(&recovered) > 0.9);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_worker_pool_shares_tracker() {
    let (stats, _, feedback) = build(&[1, 2, 3], 11, |id, nth| match (id.0 + nth as u32) % 4 {
        0 => Reply::Fail(120.0),
        1 => Reply::Error,
        _ => Reply::Ok(30.0 * id.0 as f64),
    });

    let report = feedback.run_concurrent(1_000, 4).await;

    assert_eq!(report.iterations, 1_000);
    assert_eq!(report.successes + report.failures, 1_000);
    assert_eq!(total_recorded(&stats), 1_000);
    for id in stats.endpoints() {
        let (outcomes, latencies) = stats
            .inspect(id, |s| (s.recent_outcomes().count(), s.recent_latencies().count()))
            .unwrap();
        assert_eq!(outcomes, latencies);
        assert!(outcomes <= 20);
    }
}

#[tokio::test]
async fn test_shutdown_stops_between_iterations() {
    let (stats, _, feedback) = build(&[1, 2], 1, |_, _| Reply::Ok(10.0));
    let shutdown = Shutdown::new();
    let feedback = feedback.with_shutdown(shutdown.clone());

    shutdown.trigger();
    let report = feedback.run(100).await;

    assert_eq!(report.iterations, 0);
    assert_eq!(total_recorded(&stats), 0);
}

#[test]
fn test_construction_validates_candidates() {
    let stats = Arc::new(StatsTracker::with_endpoints(20, ids(&[1, 2])));
    let backend = Arc::new(ScriptedBackend::new(|_: EndpointId, _: u64| Reply::Ok(1.0)));

    let empty = FeedbackLoop::new(
        stats.clone(),
        adaptive(&stats, 1),
        backend.clone(),
        Vec::new(),
        TIMEOUT,
    );
    assert!(matches!(empty, Err(BalancerError::Configuration(_))));

    let unknown = FeedbackLoop::new(stats.clone(), adaptive(&stats, 1), backend, ids(&[1, 7]), TIMEOUT);
    assert!(matches!(unknown, Err(BalancerError::UnknownEndpoint(EndpointId(7)))));
}
