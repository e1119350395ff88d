//! Status fetcher
//!
//! Executes one status request per call and classifies the result:
//! a `200` body, a non-`200` status that carries no usable body, or a
//! transport failure described by [`FetchFailure`]. No retries happen here;
//! every timer tick is one independent attempt.

mod http;

pub use http::{FetcherError, HttpStatusSource};

use async_trait::async_trait;
use thiserror::Error;

/// Result of a request that reached the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// HTTP 200 with its body
    Body(String),
    /// Any other status; nothing is parsed for this cycle
    NotOk(u16),
}

/// Transport-level failure (refused, timeout, DNS, TLS, truncated body)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct FetchFailure {
    pub url: String,
    pub message: String,
    /// Status exposed by the failure, 0 when there is none
    pub status: u16,
}

/// Anything that can produce the raw status document
#[async_trait]
pub trait StatusSource: Send + Sync {
    /// Target URL, used in logs and error records
    fn url(&self) -> &str;

    async fn fetch(&self) -> Result<FetchOutcome, FetchFailure>;
}
