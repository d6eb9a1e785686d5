//! Structured logging.
//!
//! Uses `tracing` for events and `tracing-subscriber` for output on stderr,
//! leaving stdout to the run summary. `RUST_LOG` wins over the configured
//! level when set.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Build the filter from `RUST_LOG`, falling back to `endpoint_balancer=<level>`.
pub fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("endpoint_balancer={default_level}")))
}

/// Initialize the global subscriber. Safe to call more than once; later calls are ignored.
pub fn init(default_level: &str) {
    let _ = tracing_subscriber::registry()
        .with(env_filter(default_level))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init();
}
