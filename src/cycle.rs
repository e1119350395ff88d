//! Cycle controller: one fetch → parse → transform → emit pass per tick
//!
//! ```text
//! Idle → Fetching → Parsing → Emitting → Idle
//!           │  │        │
//!           │  │        └── malformed ──┐
//!           │  └── transport failure ──→ Failed → Idle
//!           └── non-200 ──────────────→ Idle
//! ```
//!
//! Cycles never overlap: a tick that arrives while a cycle is in flight is
//! skipped instead of issuing a second request.

use crate::config::Config;
use crate::document::StatusDocument;
use crate::fetcher::{FetchFailure, FetchOutcome, FetcherError, HttpStatusSource, StatusSource};
use crate::request::RequestSpec;
use crate::sink::Sink;
use crate::transform::{Record, Transformer};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

/// What happens to an [`ErrorRecord`] besides being logged
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Log locally only
    LogOnly,
    /// Also emit to the sink as `<base_tag>.<category>`
    Emit { category: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CycleState {
    Idle = 0,
    Fetching = 1,
    Parsing = 2,
    Emitting = 3,
    Failed = 4,
}

impl CycleState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => CycleState::Fetching,
            2 => CycleState::Parsing,
            3 => CycleState::Emitting,
            4 => CycleState::Failed,
            _ => CycleState::Idle,
        }
    }
}

/// Failed cycle description, always built on fetch or parse failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorRecord {
    pub url: String,
    pub error: String,
    /// Status exposed by the failure, 0 when there is none
    pub status: u16,
}

impl ErrorRecord {
    pub fn to_record(&self) -> Record {
        let mut record = Record::new();
        record.insert("url".to_string(), self.url.clone());
        record.insert("error".to_string(), self.error.clone());
        record.insert("status".to_string(), self.status.to_string());
        record
    }
}

impl From<FetchFailure> for ErrorRecord {
    fn from(failure: FetchFailure) -> Self {
        Self {
            url: failure.url,
            error: failure.message,
            status: failure.status,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Document parsed; this many records were emitted (possibly zero)
    Emitted(usize),
    /// Endpoint answered with a non-200 status; nothing parsed or emitted
    NotOk(u16),
    Failed(ErrorRecord),
    /// Previous cycle still in flight
    Skipped,
}

pub struct CycleController {
    source: Arc<dyn StatusSource>,
    transformer: Transformer,
    sink: Arc<dyn Sink>,
    policy: ErrorPolicy,
    busy: Arc<AtomicBool>,
    state: Arc<AtomicU8>,
}

/// Clears the busy flag and returns to `Idle` even if the cycle is dropped.
/// Travels with the fetch task so the flag outlives an abandoned request.
struct InFlight {
    busy: Arc<AtomicBool>,
    state: Arc<AtomicU8>,
}

impl InFlight {
    fn acquire(busy: &Arc<AtomicBool>, state: &Arc<AtomicU8>) -> Option<Self> {
        busy.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self {
                busy: Arc::clone(busy),
                state: Arc::clone(state),
            })
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.state.store(CycleState::Idle as u8, Ordering::Release);
        self.busy.store(false, Ordering::Release);
    }
}

type Fetched = (Result<FetchOutcome, FetchFailure>, InFlight);

/// Aborts the fetch task when the cycle is dropped mid-request
struct FetchTask(JoinHandle<Fetched>);

impl Drop for FetchTask {
    fn drop(&mut self) {
        self.0.abort();
    }
}

impl CycleController {
    pub fn new(
        source: Arc<dyn StatusSource>,
        transformer: Transformer,
        sink: Arc<dyn Sink>,
        policy: ErrorPolicy,
    ) -> Self {
        Self {
            source,
            transformer,
            sink,
            policy,
            busy: Arc::new(AtomicBool::new(false)),
            state: Arc::new(AtomicU8::new(CycleState::Idle as u8)),
        }
    }

    /// Wire the HTTP fetcher, mapping table and error policy from configuration
    pub fn from_config(config: &Config, sink: Arc<dyn Sink>) -> Result<Self, FetcherError> {
        let spec = RequestSpec::new(config.source.url.clone(), &config.request);
        let source = HttpStatusSource::new(spec)?;
        let transformer = Transformer::new(Arc::new(config.mapping_table()), config.source.tag.clone());

        Ok(Self::new(
            Arc::new(source),
            transformer,
            sink,
            config.error_policy(),
        ))
    }

    pub fn state(&self) -> CycleState {
        CycleState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Run one cycle; never panics or propagates failures to the caller
    pub async fn run_cycle(&self) -> CycleOutcome {
        let Some(in_flight) = InFlight::acquire(&self.busy, &self.state) else {
            debug!(url = self.source.url(), "Previous cycle still in flight, skipping tick");
            return CycleOutcome::Skipped;
        };

        let span = info_span!("cycle", cycle_id = %Uuid::now_v7(), url = self.source.url());
        self.run_locked(in_flight).instrument(span).await
    }

    async fn run_locked(&self, in_flight: InFlight) -> CycleOutcome {
        self.enter(CycleState::Fetching);

        // Dropping this cycle aborts the request; the busy flag is released
        // only once the task itself is gone
        let source = Arc::clone(&self.source);
        let mut task = FetchTask(tokio::spawn(
            async move { (source.fetch().await, in_flight) }.in_current_span(),
        ));

        let (fetched, _in_flight) = match (&mut task.0).await {
            Ok(fetched) => fetched,
            Err(e) => {
                let error = ErrorRecord {
                    url: self.source.url().to_string(),
                    error: format!("fetch task aborted: {}", e),
                    status: 0,
                };
                self.report(&error);
                return CycleOutcome::Failed(error);
            }
        };

        let body = match fetched {
            Ok(FetchOutcome::Body(body)) => body,
            Ok(FetchOutcome::NotOk(status)) => {
                debug!(status, "Non-200 response, nothing to emit this cycle");
                return CycleOutcome::NotOk(status);
            }
            Err(failure) => return self.fail(failure.into()),
        };

        self.enter(CycleState::Parsing);
        let document = match StatusDocument::parse(&body) {
            Ok(document) => document,
            Err(e) => {
                return self.fail(ErrorRecord {
                    url: self.source.url().to_string(),
                    error: e.to_string(),
                    status: 0,
                });
            }
        };

        self.enter(CycleState::Emitting);
        let time = Utc::now();
        let records = self.transformer.transform(&document);
        for tagged in &records {
            self.sink.emit(&tagged.tag, time, &tagged.record);
        }

        info!(
            services = document.len(),
            records = records.len(),
            "Status cycle completed"
        );

        CycleOutcome::Emitted(records.len())
    }

    fn enter(&self, state: CycleState) {
        self.state.store(state as u8, Ordering::Release);
    }

    fn fail(&self, error: ErrorRecord) -> CycleOutcome {
        self.enter(CycleState::Failed);
        self.report(&error);
        CycleOutcome::Failed(error)
    }

    fn report(&self, error: &ErrorRecord) {
        warn!(
            url = %error.url,
            status = error.status,
            error = %error.error,
            "Status cycle failed"
        );

        if let ErrorPolicy::Emit { category } = &self.policy {
            let tag = self.transformer.tag_for(category);
            self.sink.emit(&tag, Utc::now(), &error.to_record());
        }
    }
}
