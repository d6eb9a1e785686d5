//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Selection, scoring and the feedback loop produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stderr log output
//!     → Prometheus exposition printed by the driver
//! ```
//!
//! # Design Decisions
//! - Structured fields (endpoint, score, latency) on every event
//! - Metrics are cheap and no-ops without an installed recorder

pub mod logging;
pub mod metrics;
