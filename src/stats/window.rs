//! Fixed-capacity rolling window.
//!
//! # Responsibilities
//! - Keep only the most recent `capacity` observations
//! - O(1) append with eviction of the oldest value
//! - Maintain a running sum so means never rescan the buffer
//! - Recover from an overflowed or cancelled sum as soon as huge values leave

/// Circular buffer of `f64` observations with an incremental sum.
#[derive(Debug, Clone)]
pub struct RollingWindow {
    values: Vec<f64>,
    capacity: usize,
    /// Slot the next push writes to once the buffer is full.
    head: usize,
    sum: f64,
}

impl RollingWindow {
    /// Create an empty window. A zero capacity is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            values: Vec::with_capacity(capacity),
            capacity,
            head: 0,
            sum: 0.0,
        }
    }

    /// Append a value, returning the evicted one when the window was full.
    pub fn push(&mut self, value: f64) -> Option<f64> {
        if self.values.len() < self.capacity {
            self.values.push(value);
            self.sum += value;
            return None;
        }

        let evicted = std::mem::replace(&mut self.values[self.head], value);
        self.head = (self.head + 1) % self.capacity;

        // Recompute on every lap to shed rounding error. Also recompute when the
        // sum has overflowed or the evicted value dominates it, where
        // subtracting it would cancel away the remaining values.
        let dominant = evicted.abs() * 2.0 > self.sum.abs();
        if self.head == 0 || dominant || !self.sum.is_finite() {
            self.sum = self.values.iter().sum();
        } else {
            self.sum += value - evicted;
        }
        Some(evicted)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn sum(&self) -> f64 {
        self.sum
    }

    /// Arithmetic mean, `None` when empty.
    pub fn mean(&self) -> Option<f64> {
        if self.values.is_empty() {
            None
        } else {
            Some(self.sum / self.values.len() as f64)
        }
    }

    /// Iterate from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        let (newer, older) = self.values.split_at(self.head);
        older.iter().chain(newer.iter()).copied()
    }
}
