//! Feedback loop subsystem.
//!
//! # Data Flow
//! ```text
//! runner.rs
//!     → load_balancer (select endpoint from published scores)
//!     → resilience::timeouts (call backend under deadline)
//!     → stats (record outcome, publish new snapshot)
//!     → report.rs (accumulate per-iteration results)
//! ```

pub mod report;
pub mod runner;

pub use report::{CallEnd, LoopReport, StepRecord};
pub use runner::FeedbackLoop;
