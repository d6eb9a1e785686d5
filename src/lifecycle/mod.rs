//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Driver startup:
//!     Load config → Validate → Register endpoints → Build policy → Run loop
//!
//! Shutdown (shutdown.rs):
//!     Ctrl-C → Shutdown::trigger → subscribed workers stop between iterations → summary
//! ```
//!
//! # Design Decisions
//! - An in-flight call always finishes (bounded by its timeout) and is recorded
//! - Shutdown is cooperative; no worker is aborted mid-iteration

pub mod shutdown;

pub use shutdown::{triggered, Shutdown};
