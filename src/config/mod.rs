//! Configuration management for monitpull
//!
//! This module provides a layered configuration system that loads settings from:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use monitpull::config::Config;
//!
//! let config = Config::load().expect("Failed to load configuration");
//! println!("Polling {} every {}", config.source.url, config.source.interval);
//! ```
//!
//! # Environment Variables
//!
//! Configuration can be overridden using environment variables with the pattern:
//! `MONITPULL__<section>__<key>`
//!
//! Examples:
//! - `MONITPULL__SOURCE__URL=http://monit:2812/_status?format=xml`
//! - `MONITPULL__SOURCE__INTERVAL=30s`
//! - `MONITPULL__REQUEST__VERIFY_SSL=false`
//!
//! The basic auth password is only read from `MONITPULL_PASSWORD`.
//!
//! # Configuration File
//!
//! By default, the configuration is loaded from `config/monitpull.toml`.
//! This can be overridden using the `MONITPULL_CONFIG` environment variable.

mod models;
mod sources;
mod validation;

pub use crate::humanize::HumanDuration;
pub use models::{Config, MappingOverride, OutputConfig, RequestConfig, SourceConfig};
pub use validation::ValidationError;

use crate::cycle::ErrorPolicy;
use crate::mapping::{FieldRule, MappingTable, ServiceType, TypeMapping};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

impl Config {
    /// Load configuration from all sources (file + environment)
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file is malformed or
    /// validation fails.
    pub fn load() -> Result<Self, ConfigError> {
        let config = sources::load()?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load from an explicit path, still honoring environment overrides
    /// and the password secret
    pub fn load_with_path(path: PathBuf) -> Result<Self, ConfigError> {
        let config = sources::load_with_secrets(path)?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific path without reading secrets
    ///
    /// Useful for testing with custom configuration files.
    pub fn load_from_path(path: PathBuf) -> Result<Self, ConfigError> {
        let config = sources::load_from_sources(path)?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Validate a configuration assembled in code
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::validate(self)
    }

    /// Built-in mappings with the configured overrides applied
    ///
    /// Codes are checked during validation; unknown ones are skipped here.
    pub fn mapping_table(&self) -> MappingTable {
        let overrides = self.mappings.iter().filter_map(|(code, mapping)| {
            let service_type = ServiceType::from_code(code)?;
            let fields = mapping
                .fields
                .iter()
                .map(|(output, source)| FieldRule::new(output.clone(), source.clone()))
                .collect();
            Some((service_type, TypeMapping::new(mapping.index.clone(), fields)))
        });

        MappingTable::builtin().with_overrides(overrides)
    }

    pub fn error_policy(&self) -> ErrorPolicy {
        if self.output.emit_errors {
            ErrorPolicy::Emit {
                category: self.output.error_category.clone(),
            }
        } else {
            ErrorPolicy::LogOnly
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_minimal_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let toml_content = r#"
[source]
url = "http://localhost:2812/_status?format=xml"
        "#;

        fs::write(&config_path, toml_content).unwrap();

        let config = Config::load_from_path(config_path).unwrap();
        assert_eq!(config.source.tag, "monit");
        assert_eq!(config.mapping_table(), MappingTable::builtin());
    }

    #[test]
    fn test_validation_catches_missing_url() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        fs::write(&config_path, "[source]\ntag = \"host\"\n").unwrap();

        let result = Config::load_from_path(config_path);
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::ValidationError(ValidationError::MissingUrl)
        ));
    }

    #[test]
    fn test_mapping_overrides_applied() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let toml_content = r#"
[source]
url = "http://localhost:2812/_status?format=xml"

[mappings.0]
index = "filesystem"

[mappings.0.fields]
usage = "block/percent"
inodes = "inode/percent"
        "#;

        fs::write(&config_path, toml_content).unwrap();

        let config = Config::load_from_path(config_path).unwrap();
        let table = config.mapping_table();
        let filesystem = table.get(ServiceType::Filesystem).unwrap();

        assert_eq!(table.len(), 3);
        assert_eq!(filesystem.category, "filesystem");
        assert_eq!(
            filesystem.fields,
            vec![
                FieldRule::new("inodes", "inode/percent"),
                FieldRule::new("usage", "block/percent"),
            ]
        );
    }

    #[test]
    fn test_error_policy() {
        let mut config = Config::default();
        assert_eq!(
            config.error_policy(),
            ErrorPolicy::Emit {
                category: "error".to_string()
            }
        );

        config.output.emit_errors = false;
        assert_eq!(config.error_policy(), ErrorPolicy::LogOnly);
    }
}
