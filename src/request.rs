//! Request builder: turns [`RequestConfig`] into a concrete request descriptor

use crate::config::RequestConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Methods accepted for the status request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Delete,
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpMethod::Get => f.write_str("GET"),
            HttpMethod::Post => f.write_str("POST"),
            HttpMethod::Delete => f.write_str("DELETE"),
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct BasicAuth {
    pub user: String,
    pub password: Option<String>,
}

impl fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuth")
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// CA paths are only populated when `verify` is on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsOptions {
    pub verify: bool,
    pub ca_path: Option<PathBuf>,
    pub ca_file: Option<PathBuf>,
}

/// Fully specified outbound request
///
/// Optional settings that are not configured stay `None`; the transport
/// never sees placeholder values for them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSpec {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub timeout: Duration,
    pub proxy: Option<String>,
    pub auth: Option<BasicAuth>,
    pub tls: TlsOptions,
}

impl RequestSpec {
    pub fn new(url: impl Into<String>, config: &RequestConfig) -> Self {
        let headers = vec![
            (
                reqwest::header::CONTENT_TYPE.to_string(),
                mime::APPLICATION_WWW_FORM_URLENCODED.to_string(),
            ),
            (reqwest::header::USER_AGENT.to_string(), config.agent.clone()),
        ];

        let auth = config.user.as_ref().map(|user| BasicAuth {
            user: user.clone(),
            password: config.password.clone(),
        });

        let tls = if config.verify_ssl {
            TlsOptions {
                verify: true,
                ca_path: config.ca_path.clone(),
                ca_file: config.ca_file.clone(),
            }
        } else {
            TlsOptions {
                verify: false,
                ca_path: None,
                ca_file: None,
            }
        };

        Self {
            method: config.method,
            url: url.into(),
            headers,
            timeout: config.timeout.as_duration(),
            proxy: config.proxy.clone(),
            auth,
            tls,
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::humanize::HumanDuration;

    const URL: &str = "http://localhost:2812/_status?format=xml";

    #[test]
    fn test_minimal_request() {
        let config = RequestConfig::default();
        let spec = RequestSpec::new(URL, &config);

        assert_eq!(spec.method, HttpMethod::Get);
        assert_eq!(spec.url, URL);
        assert_eq!(spec.timeout, Duration::from_secs(10));
        assert_eq!(spec.header("content-type"), Some("application/x-www-form-urlencoded"));
        assert_eq!(spec.header("User-Agent"), Some(config.agent.as_str()));
        assert_eq!(spec.headers.len(), 2);
        assert!(spec.proxy.is_none());
        assert!(spec.auth.is_none());
        assert_eq!(
            spec.tls,
            TlsOptions {
                verify: true,
                ca_path: None,
                ca_file: None
            }
        );
    }

    #[test]
    fn test_optional_settings_attached() {
        let config = RequestConfig {
            method: HttpMethod::Delete,
            agent: "probe/1.0".to_string(),
            timeout: HumanDuration::from_secs(2),
            proxy: Some("http://localhost:4040".to_string()),
            user: Some("HatsuneMiku".to_string()),
            password: Some("3939".to_string()),
            verify_ssl: true,
            ca_path: Some(PathBuf::from("/etc/ssl/certs")),
            ca_file: Some(PathBuf::from("/etc/ssl/ca.pem")),
        };
        let spec = RequestSpec::new(URL, &config);

        assert_eq!(spec.method, HttpMethod::Delete);
        assert_eq!(spec.header("user-agent"), Some("probe/1.0"));
        assert_eq!(spec.timeout, Duration::from_secs(2));
        assert_eq!(spec.proxy.as_deref(), Some("http://localhost:4040"));
        assert_eq!(
            spec.auth,
            Some(BasicAuth {
                user: "HatsuneMiku".to_string(),
                password: Some("3939".to_string())
            })
        );
        assert_eq!(spec.tls.ca_path, Some(PathBuf::from("/etc/ssl/certs")));
        assert_eq!(spec.tls.ca_file, Some(PathBuf::from("/etc/ssl/ca.pem")));
    }

    #[test]
    fn test_ca_options_dropped_without_verification() {
        let config = RequestConfig {
            verify_ssl: false,
            ca_path: Some(PathBuf::from("/etc/ssl/certs")),
            ca_file: Some(PathBuf::from("/etc/ssl/ca.pem")),
            ..RequestConfig::default()
        };
        let spec = RequestSpec::new(URL, &config);

        assert!(!spec.tls.verify);
        assert!(spec.tls.ca_path.is_none());
        assert!(spec.tls.ca_file.is_none());
    }

    #[test]
    fn test_password_redacted_in_debug() {
        let auth = BasicAuth {
            user: "admin".to_string(),
            password: Some("hunter2".to_string()),
        };
        let rendered = format!("{:?}", auth);
        assert!(rendered.contains("admin"));
        assert!(!rendered.contains("hunter2"));
    }
}
