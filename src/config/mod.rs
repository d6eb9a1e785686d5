//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → BalancerConfig (validated, immutable)
//!     → CLI overrides applied by the driver, then validated again
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::BalancerConfig;
pub use schema::FeedbackConfig;
pub use schema::ObservabilityConfig;
pub use schema::PolicyKind;
pub use schema::ScoringConfig;
pub use schema::SelectionConfig;
pub use schema::SimulationConfig;
pub use schema::StatsConfig;
pub use validation::{
    validate_config, validate_exploration_threshold, validate_scoring, ValidationError,
};
