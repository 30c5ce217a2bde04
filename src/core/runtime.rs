//! Cron-driven evaluation loop with cooperative shutdown.

use crate::core::http::HealthStatus;
use crate::core::pipeline::{SignalPipeline, TickOutcome};
use crate::error::ConfigError;
use chrono::Utc;
use cron::Schedule;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::{watch, RwLock};
use tracing::{debug, info};

/// Drives a [`SignalPipeline`] on a cron schedule until shutdown is
/// signalled. Shutdown is observed only between ticks.
pub struct SignalRuntime {
    pipeline: SignalPipeline,
    schedule: Schedule,
    shutdown: watch::Receiver<bool>,
    health: Option<Arc<RwLock<HealthStatus>>>,
}

impl SignalRuntime {
    pub fn new(
        pipeline: SignalPipeline,
        cron_expr: &str,
        shutdown: watch::Receiver<bool>,
    ) -> Result<Self, ConfigError> {
        let schedule = Schedule::from_str(cron_expr).map_err(|e| {
            ConfigError::invalid(
                "runtime.tick_cron",
                format!("invalid cron expression '{}': {}", cron_expr, e),
            )
        })?;

        info!(
            symbol = %pipeline.symbol(),
            cron = %cron_expr,
            "SignalRuntime: created"
        );
        Ok(Self {
            pipeline,
            schedule,
            shutdown,
            health: None,
        })
    }

    /// Report every tick into the status served by `/health`.
    pub fn with_health(mut self, health: Arc<RwLock<HealthStatus>>) -> Self {
        self.health = Some(health);
        self
    }

    pub fn pipeline(&self) -> &SignalPipeline {
        &self.pipeline
    }

    /// Run one tick immediately.
    pub async fn run_once(&mut self) -> TickOutcome {
        let now = Utc::now();
        let outcome = self.pipeline.tick(now).await;
        log_outcome(self.pipeline.symbol(), &outcome);
        if let Some(health) = &self.health {
            health.write().await.record_tick(&outcome, now);
        }
        outcome
    }

    /// Tick on every cron occurrence until shutdown is signalled or the
    /// sender is dropped. Returns the pipeline so the caller can inspect its
    /// final ledger.
    pub async fn run(mut self) -> SignalPipeline {
        info!("SignalRuntime: started, waiting for cron schedule...");

        loop {
            if *self.shutdown.borrow() {
                break;
            }

            let Some(next_tick) = self.schedule.upcoming(Utc).next() else {
                info!("SignalRuntime: cron schedule has no further occurrences");
                break;
            };
            let wait = (next_tick - Utc::now()).to_std().unwrap_or_default();

            let tick_due = tokio::select! {
                _ = tokio::time::sleep(wait) => true,
                changed = self.shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    false
                }
            };
            if tick_due {
                self.run_once().await;
            }
        }

        info!("SignalRuntime: stopped");
        self.pipeline
    }
}

fn log_outcome(symbol: &str, outcome: &TickOutcome) {
    match outcome {
        TickOutcome::Emitted(signal) => info!(
            symbol = %symbol,
            sequence = signal.sequence,
            direction = %signal.direction,
            "Tick emitted a signal"
        ),
        TickOutcome::Rejected(reason) => {
            debug!(symbol = %symbol, reason = %reason, "Tick candidate rejected")
        }
        TickOutcome::Skipped(reason) => {
            debug!(symbol = %symbol, reason = %reason, "Tick skipped")
        }
        TickOutcome::NoCandidate | TickOutcome::Ambiguous => {
            debug!(symbol = %symbol, outcome = ?outcome, "Tick finished without signal")
        }
    }
}
