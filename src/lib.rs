//! Adaptive client-side endpoint selection.
//!
//! Picks one of several redundant endpoints for every outgoing call, learns
//! from each outcome and steers traffic away from failing or slow endpoints,
//! while uniform exploration keeps tripped endpoints from starving.

// Core
pub mod error;
pub mod scoring;
pub mod stats;

// Traffic management
pub mod backend;
pub mod feedback;
pub mod load_balancer;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use config::BalancerConfig;
pub use error::{BalancerError, Result};
pub use feedback::{FeedbackLoop, LoopReport};
pub use load_balancer::{AdaptivePolicy, RoundRobin, SelectionPolicy};
pub use scoring::Scorer;
pub use stats::{EndpointId, EndpointSnapshot, StatsTracker};
