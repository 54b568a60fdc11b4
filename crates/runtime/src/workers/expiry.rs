//! Background sweep of elapsed timer padlocks and cursed items.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::pipeline::{ApplyPipeline, Clock};

/// Periodically calls [`ApplyPipeline::expire_due`] with the pipeline's
/// clock until cancelled.
pub struct ExpiryWorker {
    pipeline: ApplyPipeline,
    interval: Duration,
    shutdown: CancellationToken,
}

impl ExpiryWorker {
    pub fn new(pipeline: ApplyPipeline, interval: Duration, shutdown: CancellationToken) -> Self {
        tracing::info!(interval_ms = interval.as_millis() as u64, "ExpiryWorker initialized");
        Self {
            pipeline,
            interval,
            shutdown,
        }
    }

    /// Main worker loop.
    pub async fn run(self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                _ = ticker.tick() => self.sweep().await,
            }
        }
        tracing::info!("ExpiryWorker stopped");
    }

    async fn sweep(&self) {
        let now = self.pipeline.clock().now();
        match self.pipeline.expire_due(now).await {
            Ok(report) if report.changed => {
                tracing::debug!(revision = report.revision, "expired items released");
            }
            Ok(_) => {}
            Err(err) => tracing::warn!(error = %err, "expiry sweep failed"),
        }
    }
}
