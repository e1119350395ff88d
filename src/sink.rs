//! Output collaborator: where tagged, timestamped records go

use crate::transform::Record;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;
use std::sync::Mutex;
use tracing::error;

/// Receives one call per emitted record
pub trait Sink: Send + Sync {
    fn emit(&self, tag: &str, time: DateTime<Utc>, record: &Record);
}

/// One emitted event, as captured by [`MemorySink`] or written by [`StdoutSink`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Event {
    pub tag: String,
    pub time: DateTime<Utc>,
    pub record: Record,
}

/// Writes one JSON object per line to stdout
#[derive(Debug, Default)]
pub struct StdoutSink;

impl StdoutSink {
    pub fn new() -> Self {
        Self
    }
}

impl Sink for StdoutSink {
    fn emit(&self, tag: &str, time: DateTime<Utc>, record: &Record) {
        let line = serde_json::json!({
            "tag": tag,
            "time": time,
            "record": record,
        });

        let mut stdout = std::io::stdout().lock();
        if let Err(e) = writeln!(stdout, "{}", line) {
            error!(tag, error = %e, "Failed to write record to stdout");
        }
    }
}

/// Keeps every event in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<Event>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.events.lock().map(|events| events.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn take(&self) -> Vec<Event> {
        self.events
            .lock()
            .map(|mut events| std::mem::take(&mut *events))
            .unwrap_or_default()
    }
}

impl Sink for MemorySink {
    fn emit(&self, tag: &str, time: DateTime<Utc>, record: &Record) {
        if let Ok(mut events) = self.events.lock() {
            events.push(Event {
                tag: tag.to_string(),
                time,
                record: record.clone(),
            });
        }
    }
}
