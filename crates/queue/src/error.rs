use jobrelay_core::error::CoreError;

/// Errors raised by the dispatcher and broker.
///
/// Store and broker failures are kept apart so callers can log which
/// collaborator was unreachable; both surface to HTTP clients as a
/// generic failure.
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    /// Parameters failed validation; nothing was written.
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Job store error: {0}")]
    Store(#[source] sqlx::Error),

    #[error("Broker error: {0}")]
    Broker(#[source] sqlx::Error),
}
