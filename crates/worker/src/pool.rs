//! Pool of independent polling slots sharing one [`Worker`].
//!
//! Each slot loops claim -> process until the cancellation token fires.
//! Cancellation is only observed between jobs, so an in-flight job always
//! finishes and records its outcome before the slot exits.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::config::WorkerConfig;
use crate::error::WorkerError;
use crate::runtime::{Processed, Worker};

/// Back-off after an infrastructure error (store or broker unreachable).
const ERROR_BACKOFF: Duration = Duration::from_secs(1);

pub struct WorkerPool {
    worker: Worker,
    concurrency: usize,
    poll_interval: Duration,
}

impl WorkerPool {
    pub fn new(worker: Worker, config: &WorkerConfig) -> Self {
        Self {
            worker,
            concurrency: config.concurrency.max(1),
            poll_interval: config.poll_interval,
        }
    }

    /// Run every slot until `cancel` is triggered, then wait for them all.
    pub async fn run(self, cancel: CancellationToken) {
        tracing::info!(
            concurrency = self.concurrency,
            poll_interval_ms = self.poll_interval.as_millis() as u64,
            "Worker pool started",
        );

        let tracker = TaskTracker::new();
        for slot in 0..self.concurrency {
            tracker.spawn(run_slot(
                self.worker.clone(),
                slot,
                self.poll_interval,
                cancel.clone(),
            ));
        }
        tracker.close();
        tracker.wait().await;

        tracing::info!("Worker pool stopped");
    }
}

async fn run_slot(worker: Worker, slot: usize, poll_interval: Duration, cancel: CancellationToken) {
    tracing::debug!(slot, "Worker slot started");

    while !cancel.is_cancelled() {
        let idle = match worker.process_next().await {
            Ok(Some(Processed::Succeeded { .. } | Processed::Skipped { .. })) => None,
            Ok(None) => Some(poll_interval),
            // Already recorded and logged by the runtime.
            Err(WorkerError::JobFailed { .. }) => None,
            Err(e) => {
                tracing::error!(slot, error = %e, "Worker cycle failed");
                Some(ERROR_BACKOFF)
            }
        };

        if let Some(wait) = idle {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(wait) => {}
            }
        }
    }

    tracing::debug!(slot, "Worker slot stopped");
}
