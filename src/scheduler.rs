//! Timer collaborator driving the cycle controller

use crate::cycle::{CycleController, CycleOutcome};
use async_trait::async_trait;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

/// Resolves when the host wants polling to stop
pub type Shutdown = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Invokes [`CycleController::run_cycle`] once per tick until shutdown
#[async_trait]
pub trait Scheduler: Send + Sync {
    async fn run(&self, controller: Arc<CycleController>, shutdown: Shutdown);
}

/// Fixed-interval scheduler; the first tick fires immediately
#[derive(Debug, Clone)]
pub struct IntervalScheduler {
    interval: Duration,
}

impl IntervalScheduler {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

#[async_trait]
impl Scheduler for IntervalScheduler {
    async fn run(&self, controller: Arc<CycleController>, mut shutdown: Shutdown) {
        info!(interval = ?self.interval, "Starting status polling");

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        // Each cycle runs on its own task so a stalled request never delays ticks;
        // the controller skips ticks that overlap an in-flight cycle
        let mut cycles = JoinSet::new();

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = ticker.tick() => {
                    let controller = Arc::clone(&controller);
                    cycles.spawn(async move { controller.run_cycle().await });
                }
                Some(joined) = cycles.join_next(), if !cycles.is_empty() => match joined {
                    Ok(CycleOutcome::Skipped) => debug!("Tick skipped"),
                    Ok(_) => {}
                    Err(e) => error!(error = %e, "Cycle task aborted"),
                },
            }
        }

        if !cycles.is_empty() {
            info!(in_flight = cycles.len(), "Abandoning in-flight cycle");
        }
        cycles.abort_all();
        info!("Status polling stopped");
    }
}
