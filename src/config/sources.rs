use super::models::Config;
use config::{ConfigError, Environment, File};
use std::env;
use std::path::PathBuf;

const CONFIG_ENV_VAR: &str = "MONITPULL_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config/monitpull.toml";
const ENV_PREFIX: &str = "MONITPULL";
const ENV_SEPARATOR: &str = "__";
const PASSWORD_ENV_VAR: &str = "MONITPULL_PASSWORD";

/// Load configuration from multiple sources with priority:
/// 1. Defaults (embedded in structs)
/// 2. TOML file (if exists)
/// 3. Environment variables from .env file (via dotenvy)
/// 4. System environment variables (highest priority)
pub fn load() -> Result<Config, ConfigError> {
    let config_path = env::var(CONFIG_ENV_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));

    load_with_secrets(config_path)
}

/// Same as [`load`] but with an explicit file path (CLI `--config`)
pub fn load_with_secrets(config_path: PathBuf) -> Result<Config, ConfigError> {
    // Load .env file if it exists (ignore errors if file doesn't exist)
    let _ = dotenvy::dotenv();

    let mut config = load_from_sources(config_path)?;
    load_secrets(&mut config);

    Ok(config)
}

/// Secrets are never stored in TOML files, only in environment
fn load_secrets(config: &mut Config) {
    if let Ok(password) = env::var(PASSWORD_ENV_VAR) {
        config.request.password = Some(password);
    }
}

/// Load configuration from a specific path and environment
/// Useful for testing with custom config files
pub fn load_from_sources(config_path: PathBuf) -> Result<Config, ConfigError> {
    let mut builder = config::Config::builder();

    if config_path.exists() {
        tracing::info!("Loading configuration from: {}", config_path.display());
        builder = builder.add_source(File::from(config_path).required(false));
    } else {
        tracing::warn!(
            "Configuration file not found at {}, using defaults and environment overrides",
            config_path.display()
        );
    }

    // MONITPULL__SOURCE__URL -> source.url
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator(ENV_SEPARATOR)
            .try_parsing(true),
    );

    let config = builder.build()?;
    config.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_load_defaults_only() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nonexistent.toml");

        let config = load_from_sources(config_path).unwrap();
        assert_eq!(config.source.tag, "monit");
        assert_eq!(config.request.timeout.as_duration(), Duration::from_secs(10));
    }

    #[test]
    fn test_load_from_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let toml_content = r#"
[source]
tag = "host"
url = "http://localhost:2812/_status?format=xml"
interval = "3s"

[request]
method = "post"
timeout = 2
proxy = "http://localhost:4040"
user = "admin"
verify_ssl = false

[output]
emit_errors = false

[mappings.8]
index = "network"

[mappings.8.fields]
state = "link/state"
        "#;

        fs::write(&config_path, toml_content).unwrap();

        let config = load_from_sources(config_path).unwrap();
        assert_eq!(config.source.tag, "host");
        assert_eq!(config.source.url, "http://localhost:2812/_status?format=xml");
        assert_eq!(config.source.interval.as_duration(), Duration::from_secs(3));
        assert_eq!(config.request.method, crate::request::HttpMethod::Post);
        assert_eq!(config.request.timeout.as_duration(), Duration::from_secs(2));
        assert_eq!(config.request.proxy.as_deref(), Some("http://localhost:4040"));
        assert_eq!(config.request.user.as_deref(), Some("admin"));
        assert!(!config.request.verify_ssl);
        assert!(!config.output.emit_errors);

        let network = &config.mappings["8"];
        assert_eq!(network.index, "network");
        assert_eq!(network.fields["state"], "link/state");
    }

    // Note: environment overrides are not exercised here because
    // env::set_var is unsafe under edition 2024
}
