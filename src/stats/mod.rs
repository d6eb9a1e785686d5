//! Endpoint statistics subsystem.
//!
//! # Data Flow
//! ```text
//! Call completes
//!     → tracker.rs (locate endpoint slot, take its write lock)
//!     → endpoint.rs (append to outcome/latency windows, update counters)
//!     → window.rs (evict oldest, adjust running sum)
//!     → publish EndpointSnapshot (ArcSwap)
//!
//! Scoring reads the published snapshot without locking.
//! ```
//!
//! # Design Decisions
//! - Registration is append-only; endpoints are never removed
//! - Both windows share one capacity and evict in lockstep
//! - Means are derived from running sums, never by rescanning

pub mod endpoint;
pub mod tracker;
pub mod window;

pub use endpoint::{EndpointId, EndpointSnapshot, EndpointStats};
pub use tracker::{Recorded, StatsTracker, DEFAULT_WINDOW_CAPACITY};
pub use window::RollingWindow;
