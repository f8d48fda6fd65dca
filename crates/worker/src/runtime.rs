//! Per-message processing.
//!
//! ```text
//! pending --(pickup)--> started --(Ok)--> success      message acked
//!                               --(Err)-> failure      message dead-lettered
//! ```
//!
//! A message whose record is no longer `pending` is a redelivery after a
//! worker died mid-job; it is acknowledged without running anything, so the
//! record stays `started`.

use std::sync::Arc;

use jobrelay_core::jobs::{JobError, JobRegistry};
use jobrelay_core::types::JobId;
use jobrelay_db::repositories::JobRecordRepo;
use jobrelay_db::DbPool;
use jobrelay_queue::{PgBroker, QueuedMessage};

use crate::error::WorkerError;

/// Error text recorded when a message references no job record.
const MISSING_RECORD_ERROR: &str = "No job record exists for this message";

/// Outcome of handling one message that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Processed {
    /// The job ran and its record is now `success`.
    Succeeded { job_id: JobId, result: String },
    /// The record was not `pending`; the delivery was dropped.
    Skipped { job_id: JobId },
}

/// One worker: a store pool, a broker handle and the job registry.
///
/// Cheap to clone; every pool slot holds its own clone.
#[derive(Debug, Clone)]
pub struct Worker {
    store: DbPool,
    broker: PgBroker,
    registry: Arc<JobRegistry>,
}

impl Worker {
    pub fn new(store: DbPool, broker: PgBroker, registry: JobRegistry) -> Self {
        Self {
            store,
            broker,
            registry: Arc::new(registry),
        }
    }

    /// Claim and process the next message, if any.
    ///
    /// Returns `Ok(None)` when the queue has nothing visible. A failing job
    /// body comes back as [`WorkerError::JobFailed`] after its failure has
    /// been recorded and the message dead-lettered.
    pub async fn process_next(&self) -> Result<Option<Processed>, WorkerError> {
        match self.broker.claim().await? {
            Some(message) => self.process(message).await.map(Some),
            None => Ok(None),
        }
    }

    async fn process(&self, message: QueuedMessage) -> Result<Processed, WorkerError> {
        let job_id = message.job_id;

        let Some(record) =
            JobRecordRepo::mark_started(&self.store, job_id, &message.payload).await?
        else {
            return self.drop_delivery(&message).await;
        };

        tracing::info!(
            %job_id,
            job_type = %record.job_type,
            delivery_count = message.delivery_count,
            "Job started",
        );

        let outcome = match message.decode() {
            Ok(input) => self.registry.execute(&input).await,
            Err(e) => Err(JobError::InvalidInput(e.to_string())),
        };

        match outcome {
            Ok(result) => {
                let completed = JobRecordRepo::complete(&self.store, job_id, &result).await?;
                match completed {
                    Some(done) => tracing::info!(
                        %job_id,
                        duration_seconds = ?done.duration_seconds,
                        "Job succeeded",
                    ),
                    None => tracing::warn!(%job_id, "Job record left started state during execution"),
                }

                if !self.broker.ack(&message).await? {
                    tracing::warn!(%job_id, "Delivery superseded before ack");
                }

                Ok(Processed::Succeeded { job_id, result })
            }
            Err(err) => {
                let error_text = err.to_string();
                let failed = JobRecordRepo::fail(&self.store, job_id, &error_text).await?;
                if failed.is_none() {
                    tracing::warn!(%job_id, "Job record left started state during execution");
                }

                if !self.broker.dead_letter(&message, &error_text).await? {
                    tracing::warn!(%job_id, "Delivery superseded before dead-letter");
                }

                tracing::error!(%job_id, error = %error_text, "Job failed");

                Err(WorkerError::JobFailed {
                    job_id,
                    source: err,
                })
            }
        }
    }

    /// Handle a delivery whose record could not be moved to `started`.
    async fn drop_delivery(&self, message: &QueuedMessage) -> Result<Processed, WorkerError> {
        let job_id = message.job_id;

        match JobRecordRepo::find_by_job_id(&self.store, job_id).await? {
            Some(existing) => {
                tracing::warn!(
                    %job_id,
                    status_id = existing.status_id,
                    delivery_count = message.delivery_count,
                    "Job record is not pending; dropping duplicate delivery",
                );
                self.broker.ack(message).await?;
            }
            None => {
                tracing::error!(%job_id, "Message references an unknown job record");
                self.broker.dead_letter(message, MISSING_RECORD_ERROR).await?;
            }
        }

        Ok(Processed::Skipped { job_id })
    }
}
