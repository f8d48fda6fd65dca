//! PostgreSQL-backed message broker.
//!
//! Messages live in `job_queue`. A claim hides the message for the
//! visibility timeout and bumps its delivery count; an ack deletes it; a
//! dead-letter keeps it with the error for inspection. A message whose
//! worker dies becomes visible again once the timeout lapses, giving
//! at-least-once delivery. Claims use `FOR UPDATE SKIP LOCKED` so any
//! number of workers can poll concurrently without double delivery.

use std::time::Duration;

use jobrelay_core::error::CoreError;
use jobrelay_core::job_input::JobInput;
use jobrelay_core::job_type::JobType;
use jobrelay_core::types::{DbId, JobId, Timestamp};
use sqlx::{FromRow, PgPool};

use crate::error::QueueError;

/// Column list for `job_queue` queries.
const COLUMNS: &str = "\
    id, job_id, job_type, payload, delivery_count, visible_at, \
    dead_lettered_at, last_error, created_at, updated_at";

/// Default time a claimed message stays hidden from other workers.
pub const DEFAULT_VISIBILITY_TIMEOUT: Duration = Duration::from_secs(300);

/// A row from the `job_queue` table.
#[derive(Debug, Clone, FromRow)]
pub struct QueuedMessage {
    pub id: DbId,
    pub job_id: JobId,
    pub job_type: String,
    pub payload: serde_json::Value,
    pub delivery_count: i32,
    pub visible_at: Timestamp,
    pub dead_lettered_at: Option<Timestamp>,
    pub last_error: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl QueuedMessage {
    /// Decode the payload into a validated job input.
    pub fn decode(&self) -> Result<JobInput, CoreError> {
        let job_type: JobType = self.job_type.parse()?;
        JobInput::from_snapshot(job_type, &self.payload)
    }
}

/// Handle to the queue table.
#[derive(Debug, Clone)]
pub struct PgBroker {
    pool: PgPool,
    visibility_timeout: Duration,
}

impl PgBroker {
    /// Create a broker over `pool` with the default visibility timeout.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            visibility_timeout: DEFAULT_VISIBILITY_TIMEOUT,
        }
    }

    pub fn with_visibility_timeout(mut self, timeout: Duration) -> Self {
        self.visibility_timeout = timeout;
        self
    }

    pub fn visibility_timeout(&self) -> Duration {
        self.visibility_timeout
    }

    /// Verify the broker database answers.
    pub async fn health_check(&self) -> Result<(), QueueError> {
        jobrelay_db::health_check(&self.pool)
            .await
            .map_err(QueueError::Broker)
    }

    /// Place one message on the queue, immediately visible.
    pub async fn publish(&self, job_id: JobId, input: &JobInput) -> Result<QueuedMessage, QueueError> {
        let query = format!(
            "INSERT INTO job_queue (job_id, job_type, payload) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, QueuedMessage>(&query)
            .bind(job_id)
            .bind(input.job_type().as_str())
            .bind(input.to_value())
            .fetch_one(&self.pool)
            .await
            .map_err(QueueError::Broker)
    }

    /// Claim the oldest visible, live message.
    ///
    /// The claimed message is hidden for the visibility timeout and its
    /// `delivery_count` incremented. Returns `None` when nothing is ready.
    pub async fn claim(&self) -> Result<Option<QueuedMessage>, QueueError> {
        let query = format!(
            "UPDATE job_queue \
             SET visible_at = NOW() + make_interval(secs => $1), \
                 delivery_count = delivery_count + 1 \
             WHERE id = ( \
                 SELECT id FROM job_queue \
                 WHERE dead_lettered_at IS NULL AND visible_at <= NOW() \
                 ORDER BY visible_at ASC, id ASC \
                 LIMIT 1 \
                 FOR UPDATE SKIP LOCKED \
             ) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, QueuedMessage>(&query)
            .bind(self.visibility_timeout.as_secs_f64())
            .fetch_optional(&self.pool)
            .await
            .map_err(QueueError::Broker)
    }

    /// Acknowledge a delivery, removing the message.
    ///
    /// Returns `false` if the delivery was superseded (the visibility timeout
    /// lapsed and another worker claimed the message).
    pub async fn ack(&self, message: &QueuedMessage) -> Result<bool, QueueError> {
        let result = sqlx::query(
            "DELETE FROM job_queue \
             WHERE id = $1 AND delivery_count = $2 AND dead_lettered_at IS NULL",
        )
        .bind(message.id)
        .bind(message.delivery_count)
        .execute(&self.pool)
        .await
        .map_err(QueueError::Broker)?;
        Ok(result.rows_affected() > 0)
    }

    /// Retire a failed delivery into the dead-letter set with its error.
    ///
    /// Dead-lettered messages are never redelivered. Returns `false` if the
    /// delivery was superseded.
    pub async fn dead_letter(&self, message: &QueuedMessage, error: &str) -> Result<bool, QueueError> {
        let result = sqlx::query(
            "UPDATE job_queue \
             SET dead_lettered_at = NOW(), last_error = $3 \
             WHERE id = $1 AND delivery_count = $2 AND dead_lettered_at IS NULL",
        )
        .bind(message.id)
        .bind(message.delivery_count)
        .bind(error)
        .execute(&self.pool)
        .await
        .map_err(QueueError::Broker)?;
        Ok(result.rows_affected() > 0)
    }

    /// Dead-lettered messages, newest first.
    pub async fn dead_letters(&self, limit: i64) -> Result<Vec<QueuedMessage>, QueueError> {
        let query = format!(
            "SELECT {COLUMNS} FROM job_queue \
             WHERE dead_lettered_at IS NOT NULL \
             ORDER BY dead_lettered_at DESC, id DESC \
             LIMIT $1"
        );
        sqlx::query_as::<_, QueuedMessage>(&query)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(QueueError::Broker)
    }

    /// Number of live (not dead-lettered) messages, visible or in flight.
    pub async fn depth(&self) -> Result<i64, QueueError> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM job_queue WHERE dead_lettered_at IS NULL",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(QueueError::Broker)
    }
}
