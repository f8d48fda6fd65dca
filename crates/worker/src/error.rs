use jobrelay_core::jobs::JobError;
use jobrelay_core::types::JobId;
use jobrelay_queue::QueueError;

#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    /// The job body failed. The record is already marked `failure` and the
    /// message dead-lettered by the time this is returned.
    #[error("Job {job_id} failed: {source}")]
    JobFailed {
        job_id: JobId,
        #[source]
        source: JobError,
    },

    #[error("Job store error: {0}")]
    Store(#[from] sqlx::Error),

    #[error(transparent)]
    Queue(#[from] QueueError),
}
