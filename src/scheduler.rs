//! Background reconciliation.
//!
//! Runs the day-rollover jobs on a fixed interval. Both jobs are idempotent,
//! so running them more often than once a day is harmless.

use std::sync::Arc;
use std::time::Duration;

use habitual_core::{EffectSink, HabitEngine};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Result of one reconciliation pass.
#[derive(Debug, Clone, Serialize)]
pub struct PassSummary {
    pub completions_reset: usize,
    pub streaks_scanned: usize,
    pub streaks_reset: usize,
    pub streak_failures: usize,
}

/// Run both reconciliation jobs once and dispatch their effects.
pub fn run_pass(engine: &HabitEngine, sink: &dyn EffectSink) -> anyhow::Result<PassSummary> {
    let completions_reset = engine.reset_daily_completions()?;
    let report = engine.check_and_reset_broken_streaks()?.dispatch(sink);

    for failure in &report.failures {
        warn!(habit_id = %failure.habit_id, "Skipped habit during reconciliation: {}", failure.error);
    }

    Ok(PassSummary {
        completions_reset,
        streaks_scanned: report.scanned,
        streaks_reset: report.affected,
        streak_failures: report.failures.len(),
    })
}

/// Start the reconciliation loop.
///
/// Returns a shutdown sender - drop it or send to stop the task.
pub fn spawn_reconciler(
    engine: HabitEngine,
    sink: Arc<dyn EffectSink>,
    interval: Duration,
) -> (watch::Sender<()>, JoinHandle<()>) {
    let (shutdown_tx, mut shutdown_rx) = watch::channel(());

    let handle = tokio::spawn(async move {
        info!("Reconciliation task started (interval: {:?})", interval);

        loop {
            let engine = engine.clone();
            let sink = Arc::clone(&sink);
            let pass = tokio::task::spawn_blocking(move || run_pass(&engine, sink.as_ref()));

            match pass.await {
                Ok(Ok(summary)) => debug!(?summary, "Reconciliation pass completed"),
                Ok(Err(e)) => warn!("Reconciliation pass failed: {:#}", e),
                Err(e) => warn!("Reconciliation pass panicked: {}", e),
            }

            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = shutdown_rx.changed() => {
                    info!("Reconciliation task shutting down");
                    break;
                }
            }
        }
    });

    (shutdown_tx, handle)
}
