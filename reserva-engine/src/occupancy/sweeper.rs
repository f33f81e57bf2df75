//! Auto-Release Sweeper
//!
//! Periodic background task that walks all occupancy records, warns on
//! parties nearing their deadline and force-releases overdue tables. Runs
//! until its cancellation token fires; a failed tick is logged and the work
//! is retried on the next one.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use shared::util::now_millis;

use crate::occupancy::OccupancyService;

/// Registered as `TaskKind::Periodic` in `start_background_tasks()`.
pub struct AutoReleaseSweeper {
    occupancy: Arc<OccupancyService>,
    interval: Duration,
    shutdown: CancellationToken,
}

impl AutoReleaseSweeper {
    pub fn new(
        occupancy: Arc<OccupancyService>,
        interval: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            occupancy,
            interval,
            shutdown,
        }
    }

    /// Main loop: tick, sweep, repeat until shutdown.
    pub async fn run(self) {
        tracing::info!(interval_secs = self.interval.as_secs(), "Auto-release sweeper started");

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    tracing::info!("Auto-release sweeper received shutdown signal");
                    break;
                }
                _ = ticker.tick() => {
                    let stats = self.occupancy.sweep_once(now_millis()).await;
                    if stats.released > 0 || stats.failed > 0 {
                        tracing::info!(
                            checked = stats.checked,
                            warned = stats.warned,
                            released = stats.released,
                            failed = stats.failed,
                            "Sweep completed"
                        );
                    } else {
                        tracing::trace!(checked = stats.checked, "Sweep completed");
                    }
                }
            }
        }

        tracing::info!("Auto-release sweeper stopped");
    }
}
