//! HTTP client for the Monit status endpoint

use super::{FetchFailure, FetchOutcome, StatusSource};
use crate::request::{RequestSpec, TlsOptions};
use async_trait::async_trait;
use reqwest::{Certificate, Client, Proxy, StatusCode};
use std::error::Error as StdError;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Client construction errors, surfaced at startup
#[derive(Debug, Error)]
pub enum FetcherError {
    #[error("Invalid proxy: {0}")]
    InvalidProxy(String),

    #[error("Failed to read CA certificates from {path}: {source}")]
    CaRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid CA certificate in {path}: {reason}")]
    InvalidCertificate { path: PathBuf, reason: String },

    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

pub type Result<T> = std::result::Result<T, FetcherError>;

const CERT_EXTENSIONS: &[&str] = &["pem", "crt", "cer"];

/// Fetches the status document over HTTP(S)
pub struct HttpStatusSource {
    client: Client,
    spec: RequestSpec,
}

impl HttpStatusSource {
    /// Build the underlying client once; it is reused for every cycle
    pub fn new(spec: RequestSpec) -> Result<Self> {
        let mut builder = Client::builder()
            .timeout(spec.timeout)
            .redirect(reqwest::redirect::Policy::limited(10));

        if let Some(url) = &spec.proxy {
            let proxy = Proxy::all(url).map_err(|e| FetcherError::InvalidProxy(e.to_string()))?;
            builder = builder.proxy(proxy);
        }

        if spec.tls.verify {
            for certificate in load_certificates(&spec.tls)? {
                builder = builder.add_root_certificate(certificate);
            }
        } else {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = builder
            .build()
            .map_err(|e| FetcherError::Client(e.to_string()))?;

        Ok(Self { client, spec })
    }

    pub fn spec(&self) -> &RequestSpec {
        &self.spec
    }

    fn failure(&self, err: reqwest::Error) -> FetchFailure {
        FetchFailure {
            url: self.spec.url.clone(),
            message: error_chain(&err),
            status: err.status().map(|status| status.as_u16()).unwrap_or(0),
        }
    }
}

#[async_trait]
impl StatusSource for HttpStatusSource {
    fn url(&self) -> &str {
        &self.spec.url
    }

    async fn fetch(&self) -> std::result::Result<FetchOutcome, FetchFailure> {
        let url = self.spec.url.as_str();
        debug!(url, method = %self.spec.method, "Requesting status document");

        let mut request = self.client.request(self.spec.method.into(), url);

        for (name, value) in &self.spec.headers {
            request = request.header(name, value);
        }

        if let Some(auth) = &self.spec.auth {
            request = request.basic_auth(&auth.user, auth.password.as_ref());
        }

        let response = request.send().await.map_err(|e| self.failure(e))?;

        let status = response.status();
        if status != StatusCode::OK {
            debug!(url, status = status.as_u16(), "Status endpoint returned non-200");
            return Ok(FetchOutcome::NotOk(status.as_u16()));
        }

        let body = response.text().await.map_err(|e| self.failure(e))?;

        debug!(url, size = body.len(), "Status document received");

        Ok(FetchOutcome::Body(body))
    }
}

/// Render an error with its sources, reqwest's top-level message alone is vague
fn error_chain(err: &dyn StdError) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

fn load_certificates(tls: &TlsOptions) -> Result<Vec<Certificate>> {
    let mut certificates = Vec::new();

    if let Some(file) = &tls.ca_file {
        certificates.extend(read_pem_bundle(file)?);
    }

    if let Some(dir) = &tls.ca_path {
        let entries = std::fs::read_dir(dir).map_err(|source| FetcherError::CaRead {
            path: dir.clone(),
            source,
        })?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| is_certificate_file(path))
            .collect();
        paths.sort();

        for path in paths {
            match read_pem_bundle(&path) {
                Ok(bundle) => certificates.extend(bundle),
                // Directories like /etc/ssl/certs carry unrelated files
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping CA file"),
            }
        }
    }

    Ok(certificates)
}

fn is_certificate_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| CERT_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
            .unwrap_or(false)
}

fn read_pem_bundle(path: &Path) -> Result<Vec<Certificate>> {
    let pem = std::fs::read(path).map_err(|source| FetcherError::CaRead {
        path: path.to_path_buf(),
        source,
    })?;

    Certificate::from_pem_bundle(&pem).map_err(|e| FetcherError::InvalidCertificate {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}
