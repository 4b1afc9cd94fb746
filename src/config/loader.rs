//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::RouterConfig;
use crate::config::validation::{validate_config, ValidationError};

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

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<RouterConfig, ConfigError> {
    let config: RouterConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<RouterConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.health.min_requests, 12);
        assert_eq!(config.health.base_open_ms, 8_000);
        assert_eq!(config.retry.max_retries, 1);
        assert_eq!(config.evidence.max_per_domain, 2);
        assert!(config.providers.is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[health]
min_requests = 5
fail_rate_threshold = 0.5
trip_on_terminal = false

[retry]
max_retries = 3

[[providers]]
id = "research-a"
tier = "rich"

[[providers]]
id = "search-b"
"#
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.health.min_requests, 5);
        assert!(!config.health.trip_on_terminal);
        assert_eq!(config.health.target_latency_ms, 4_000);
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.providers.len(), 2);
        assert_eq!(config.providers[0].tier.as_deref(), Some("rich"));
        assert_eq!(config.providers[1].tier, None);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = parse_config("[health]\nfail_rate_threshold = 2.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("health.fail_rate_threshold"));
    }

    #[test]
    fn test_syntax_error() {
        let err = parse_config("[health\nmin_requests = 1").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("/nonexistent/provider-router.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
