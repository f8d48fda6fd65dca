//! Job dispatcher.
//!
//! Validates parameters, assigns a fresh job id, records the job as
//! `pending` in the job store, and publishes it to the broker. Returns as
//! soon as the message is on the queue; it never waits for execution.

use jobrelay_core::job_input::JobInput;
use jobrelay_core::job_type::JobType;
use jobrelay_core::types::JobId;
use jobrelay_db::repositories::JobRecordRepo;
use jobrelay_db::DbPool;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::broker::PgBroker;
use crate::error::QueueError;

/// Outcome of a successful dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatched {
    pub job_id: JobId,
    pub job_type: JobType,
    /// Human readable confirmation, e.g. `"Task started: Adding 2 + 3"`.
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct Dispatcher {
    store: DbPool,
    broker: PgBroker,
}

impl Dispatcher {
    pub fn new(store: DbPool, broker: PgBroker) -> Self {
        Self { store, broker }
    }

    pub fn broker(&self) -> &PgBroker {
        &self.broker
    }

    /// Validate raw request parameters for `job_type`, then dispatch.
    ///
    /// Validation failures return [`QueueError::Core`] before anything is
    /// written.
    pub async fn dispatch_params(
        &self,
        job_type: JobType,
        params: &Map<String, Value>,
    ) -> Result<Dispatched, QueueError> {
        let input = JobInput::from_params(job_type, params)?;
        self.dispatch(&input).await
    }

    /// Dispatch an already validated input.
    ///
    /// If the broker rejects the publish, the pending record stays behind
    /// untouched and the error is returned to the caller.
    pub async fn dispatch(&self, input: &JobInput) -> Result<Dispatched, QueueError> {
        let job_id = Uuid::new_v4();
        let job_type = input.job_type();

        JobRecordRepo::create_pending(&self.store, job_id, job_type, &input.to_value())
            .await
            .map_err(QueueError::Store)?;

        if let Err(e) = self.broker.publish(job_id, input).await {
            tracing::error!(
                %job_id,
                job_type = %job_type,
                error = %e,
                "Failed to publish job to broker; record left pending",
            );
            return Err(e);
        }

        tracing::info!(%job_id, job_type = %job_type, "Job dispatched");

        Ok(Dispatched {
            job_id,
            job_type,
            message: input.started_message(),
        })
    }
}
