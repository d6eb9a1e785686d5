//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::BalancerConfig;
use crate::config::validation::{join_errors, validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<BalancerConfig, ConfigError> {
    let config: BalancerConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<BalancerConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::simulated::Scenario;
    use crate::config::PolicyKind;
    use crate::stats::EndpointId;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.endpoints.len(), 3);
        assert_eq!(config.stats.window_capacity, 20);
        assert_eq!(config.scoring.trip_threshold, 3);
    }

    #[test]
    fn test_partial_document() {
        let config = parse_config(
            r#"
            endpoints = [10, 20]

            [selection]
            policy = "round_robin"
            seed = 42

            [simulation]
            scenario = "outage"
            "#,
        )
        .unwrap();

        assert_eq!(config.endpoints, vec![EndpointId(10), EndpointId(20)]);
        assert_eq!(config.selection.policy, PolicyKind::RoundRobin);
        assert_eq!(config.selection.seed, Some(42));
        assert_eq!(config.selection.exploration_threshold, 0.2);
        assert_eq!(config.simulation.scenario, Scenario::Outage);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = parse_config("[scoring]\nsuccess_weight = 0.9\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref errors) if errors.len() == 1));
        assert!(err.to_string().starts_with("Validation failed: scoring weights must sum"));
    }

    #[test]
    fn test_syntax_error() {
        assert!(matches!(parse_config("endpoints = ["), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("balancer-config-{}.toml", std::process::id()));
        fs::write(&path, "[feedback]\niterations = 50\n").unwrap();
        let config = load_config(&path).unwrap();
        fs::remove_file(&path).unwrap();
        assert_eq!(config.feedback.iterations, 50);

        assert!(matches!(
            load_config(Path::new("/definitely/not/here.toml")),
            Err(ConfigError::Io(_))
        ));
    }
}
