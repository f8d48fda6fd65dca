/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// External-facing job identifier (`task_id` on the wire).
pub type JobId = uuid::Uuid;
