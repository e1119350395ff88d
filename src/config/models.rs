use crate::humanize::HumanDuration;
use crate::request::HttpMethod;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub request: RequestConfig,
    #[serde(default)]
    pub output: OutputConfig,
    /// Extra or replacement type mappings, keyed by Monit type code
    #[serde(default)]
    pub mappings: BTreeMap<String, MappingOverride>,
}

/// What to poll and how records are tagged
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceConfig {
    /// Base tag; records are emitted as `<tag>.<category>`
    #[serde(default = "default_tag")]
    pub tag: String,
    /// Monit status endpoint, e.g. `http://localhost:2812/_status?format=xml`
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_interval")]
    pub interval: HumanDuration,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            tag: default_tag(),
            url: String::new(),
            interval: default_interval(),
        }
    }
}

fn default_tag() -> String {
    "monit".to_string()
}

fn default_interval() -> HumanDuration {
    HumanDuration::from_secs(60)
}

/// Outbound request settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RequestConfig {
    #[serde(default)]
    pub method: HttpMethod,
    #[serde(default = "default_agent")]
    pub agent: String,
    #[serde(default = "default_timeout")]
    pub timeout: HumanDuration,
    pub proxy: Option<String>,
    pub user: Option<String>,
    /// Basic auth password (loaded from environment, not from config file)
    #[serde(skip)]
    pub password: Option<String>,
    #[serde(default = "default_verify_ssl")]
    pub verify_ssl: bool,
    /// Directory of PEM certificates, only used when `verify_ssl` is on
    pub ca_path: Option<PathBuf>,
    /// PEM bundle, only used when `verify_ssl` is on
    pub ca_file: Option<PathBuf>,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            method: HttpMethod::default(),
            agent: default_agent(),
            timeout: default_timeout(),
            proxy: None,
            user: None,
            password: None,
            verify_ssl: default_verify_ssl(),
            ca_path: None,
            ca_file: None,
        }
    }
}

fn default_agent() -> String {
    format!("monitpull/{}", env!("CARGO_PKG_VERSION"))
}

fn default_timeout() -> HumanDuration {
    HumanDuration::from_secs(10)
}

fn default_verify_ssl() -> bool {
    true
}

/// Failure record delivery
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    /// Deliver failed cycles to the sink as `<tag>.<error_category>` records
    #[serde(default = "default_emit_errors")]
    pub emit_errors: bool,
    #[serde(default = "default_error_category")]
    pub error_category: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            emit_errors: default_emit_errors(),
            error_category: default_error_category(),
        }
    }
}

fn default_emit_errors() -> bool {
    true
}

fn default_error_category() -> String {
    "error".to_string()
}

/// Type mapping supplied through configuration
///
/// ```toml
/// [mappings.8]
/// index = "network"
///
/// [mappings.8.fields]
/// download-bytes = "link/download/bytes/now"
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MappingOverride {
    pub index: String,
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.source.tag, "monit");
        assert!(config.source.url.is_empty());
        assert_eq!(config.source.interval.as_duration(), Duration::from_secs(60));
        assert_eq!(config.request.method, HttpMethod::Get);
        assert_eq!(config.request.timeout.as_duration(), Duration::from_secs(10));
        assert!(config.request.verify_ssl);
        assert!(config.request.agent.starts_with("monitpull/"));
        assert!(config.output.emit_errors);
        assert_eq!(config.output.error_category, "error");
        assert!(config.mappings.is_empty());
    }

    #[test]
    fn test_password_never_deserialized() {
        let toml_content = r#"
[request]
user = "admin"
password = "leaked"
        "#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.request.user.as_deref(), Some("admin"));
        assert!(config.request.password.is_none());
    }
}
