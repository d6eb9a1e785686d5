//! Shared registry of endpoint statistics.
//!
//! # Concurrency
//! - Writers serialise per endpoint through a `Mutex<EndpointStats>`
//! - Every write publishes a fresh `EndpointSnapshot` through `ArcSwap`
//! - Readers load the published snapshot and never touch the write lock
//!
//! Snapshots may trail an in-flight write by one outcome. Scores are
//! heuristics, so that staleness is accepted.

use std::sync::{Arc, Mutex};

use arc_swap::ArcSwap;
use dashmap::DashMap;

use crate::error::{BalancerError, Result};
use crate::stats::endpoint::{EndpointId, EndpointSnapshot, EndpointStats};

/// Default rolling window length.
pub const DEFAULT_WINDOW_CAPACITY: usize = 20;

#[derive(Debug)]
struct EndpointSlot {
    stats: Mutex<EndpointStats>,
    published: ArcSwap<EndpointSnapshot>,
}

impl EndpointSlot {
    fn new(id: EndpointId, capacity: usize) -> Self {
        let stats = EndpointStats::new(id, capacity);
        let published = ArcSwap::from_pointee(stats.snapshot());
        Self {
            stats: Mutex::new(stats),
            published,
        }
    }
}

/// Snapshots taken on either side of one write, under the same lock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Recorded {
    pub previous: EndpointSnapshot,
    pub current: EndpointSnapshot,
}

/// Owns the per-endpoint history for one client.
#[derive(Debug)]
pub struct StatsTracker {
    slots: DashMap<EndpointId, Arc<EndpointSlot>>,
    window_capacity: usize,
}

impl StatsTracker {
    /// Create an empty tracker whose windows hold `window_capacity` entries.
    pub fn new(window_capacity: usize) -> Self {
        Self {
            slots: DashMap::new(),
            window_capacity: window_capacity.max(1),
        }
    }

    /// Create a tracker with the given endpoints already registered.
    pub fn with_endpoints<I>(window_capacity: usize, ids: I) -> Self
    where
        I: IntoIterator<Item = EndpointId>,
    {
        let tracker = Self::new(window_capacity);
        for id in ids {
            tracker.register(id);
        }
        tracker
    }

    /// Register an endpoint. Returns `false` if it was already known,
    /// in which case its history is left untouched.
    pub fn register(&self, id: EndpointId) -> bool {
        let mut inserted = false;
        self.slots.entry(id).or_insert_with(|| {
            inserted = true;
            Arc::new(EndpointSlot::new(id, self.window_capacity))
        });
        if inserted {
            tracing::debug!(endpoint = %id, capacity = self.window_capacity, "Endpoint registered");
        }
        inserted
    }

    pub fn contains(&self, id: EndpointId) -> bool {
        self.slots.contains_key(&id)
    }

    /// All registered endpoints in ascending id order.
    pub fn endpoints(&self) -> Vec<EndpointId> {
        let mut ids: Vec<EndpointId> = self.slots.iter().map(|entry| *entry.key()).collect();
        ids.sort_unstable();
        ids
    }

    pub fn window_capacity(&self) -> usize {
        self.window_capacity
    }

    fn slot(&self, id: EndpointId) -> Result<Arc<EndpointSlot>> {
        self.slots
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or(BalancerError::UnknownEndpoint(id))
    }

    /// Record the outcome of one call against `id`.
    pub fn record_outcome(&self, id: EndpointId, success: bool, latency_ms: f64) -> Result<Recorded> {
        let slot = self.slot(id)?;
        if !latency_ms.is_finite() || latency_ms < 0.0 {
            return Err(BalancerError::InvalidLatency(latency_ms));
        }

        let mut stats = slot.stats.lock().expect("endpoint stats mutex poisoned");
        let previous = stats.snapshot();
        stats.record(success, latency_ms);
        let current = stats.snapshot();
        // Publish while still holding the lock so snapshots land in write order.
        slot.published.store(Arc::new(current));
        Ok(Recorded { previous, current })
    }

    /// Latest published snapshot for `id`.
    pub fn snapshot(&self, id: EndpointId) -> Result<EndpointSnapshot> {
        Ok(**self.slot(id)?.published.load())
    }

    /// Snapshots of every registered endpoint, ascending by id.
    pub fn snapshots(&self) -> Vec<EndpointSnapshot> {
        let mut snaps: Vec<EndpointSnapshot> = self
            .slots
            .iter()
            .map(|entry| **entry.value().published.load())
            .collect();
        snaps.sort_unstable_by_key(|s| s.id);
        snaps
    }

    /// Run `f` against the full history of `id` under its write lock.
    pub fn inspect<T>(&self, id: EndpointId, f: impl FnOnce(&EndpointStats) -> T) -> Result<T> {
        let slot = self.slot(id)?;
        let stats = slot.stats.lock().expect("endpoint stats mutex poisoned");
        Ok(f(&stats))
    }
}

impl Default for StatsTracker {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_CAPACITY)
    }
}
