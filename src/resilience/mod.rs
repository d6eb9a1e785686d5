//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Call to backend:
//!     → timeouts.rs (enforce deadline, normalise errors into failures)
//!     → outcome recorded in stats
//!     → circuit_breaker.rs (derive Closed/Open from the failure streak)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every backend call has a deadline
//! - Circuit state is derived per endpoint, never stored separately
//! - Recovery probing rides on selection's exploration fallback

pub mod circuit_breaker;
pub mod timeouts;
