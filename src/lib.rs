pub mod config;
pub mod cycle;
pub mod document;
pub mod fetcher;
pub mod humanize;
pub mod mapping;
pub mod observability;
pub mod request;
pub mod scheduler;
pub mod sink;
pub mod transform;

pub use cycle::{CycleController, CycleOutcome, CycleState, ErrorPolicy, ErrorRecord};
pub use sink::Sink;
