//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::ProxyConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("validation failed: {}", format_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn format_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: ProxyConfig = toml::from_str(&content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_toml_fills_defaults() {
        let config: ProxyConfig = toml::from_str("").unwrap();
        assert_eq!(config.listener.max_workers, 400);
        assert_eq!(config.io.chunk_bytes, 4096);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn partial_section_overrides_only_named_fields() {
        let config: ProxyConfig = toml::from_str(
            "[cache]\ncapacity_bytes = 1048576\n\n[listener]\nmax_workers = 8\n",
        )
        .unwrap();
        assert_eq!(config.cache.capacity_bytes, 1 << 20);
        assert_eq!(config.cache.max_entry_bytes, 10 << 20);
        assert_eq!(config.listener.max_workers, 8);
    }
}
