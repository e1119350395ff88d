use monitpull::config::Config;
use monitpull::cycle::{CycleController, CycleOutcome};
use monitpull::scheduler::{IntervalScheduler, Scheduler};
use monitpull::sink::StdoutSink;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

fn load_config(path: Option<PathBuf>) -> Result<Config, AnyError> {
    let config = match path {
        Some(path) => Config::load_with_path(path)?,
        None => Config::load()?,
    };
    Ok(config)
}

/// Poll until Ctrl+C or SIGTERM
pub async fn run(config_path: Option<PathBuf>) -> Result<(), AnyError> {
    let config = load_config(config_path)?;
    let controller = Arc::new(CycleController::from_config(&config, Arc::new(StdoutSink::new()))?);

    info!(
        url = %config.source.url,
        tag = %config.source.tag,
        interval = %config.source.interval,
        "monitpull started"
    );

    IntervalScheduler::new(config.source.interval.as_duration())
        .run(controller, Box::pin(shutdown_signal()))
        .await;

    Ok(())
}

/// Single cycle; fails the process only when the cycle failed
pub async fn once(config_path: Option<PathBuf>) -> Result<(), AnyError> {
    let config = load_config(config_path)?;
    let controller = CycleController::from_config(&config, Arc::new(StdoutSink::new()))?;

    match controller.run_cycle().await {
        CycleOutcome::Failed(error) => Err(format!("{} ({})", error.error, error.url).into()),
        CycleOutcome::NotOk(status) => {
            info!(status, "Status endpoint returned non-200, nothing emitted");
            Ok(())
        }
        _ => Ok(()),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
