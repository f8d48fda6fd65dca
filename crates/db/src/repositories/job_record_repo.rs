//! Repository for the `job_records` table.
//!
//! Every status transition is a conditional UPDATE guarded on the expected
//! prior status, so transitions can only move forward. A guarded update
//! that matches no row returns `None`.

use jobrelay_core::job_type::JobType;
use jobrelay_core::types::JobId;
use sqlx::PgPool;

use crate::models::job_record::{JobRecord, JobRecordFilter};
use crate::models::status::JobStatus;

/// Column list for `job_records` queries.
const COLUMNS: &str = "\
    id, job_id, job_type, status_id, input_data, result, error, \
    started_at, completed_at, duration_seconds, created_at, updated_at";

/// Maximum page size for record listing.
const MAX_LIMIT: i64 = 100;

/// Default page size for record listing.
const DEFAULT_LIMIT: i64 = 50;

/// Seconds between `started_at` and now, never negative.
const DURATION_EXPR: &str =
    "GREATEST(EXTRACT(EPOCH FROM (NOW() - COALESCE(started_at, NOW()))), 0)::DOUBLE PRECISION";

/// Provides lifecycle operations for job records.
pub struct JobRecordRepo;

impl JobRecordRepo {
    /// Insert a new `pending` record at dispatch time.
    pub async fn create_pending(
        pool: &PgPool,
        job_id: JobId,
        job_type: JobType,
        input_data: &serde_json::Value,
    ) -> Result<JobRecord, sqlx::Error> {
        let query = format!(
            "INSERT INTO job_records (job_id, job_type, status_id, input_data) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, JobRecord>(&query)
            .bind(job_id)
            .bind(job_type.as_str())
            .bind(JobStatus::Pending.id())
            .bind(input_data)
            .fetch_one(pool)
            .await
    }

    /// Transition `pending -> started` on worker pickup, writing the input
    /// snapshot the worker received.
    ///
    /// Returns `None` if the record does not exist or is no longer pending
    /// (e.g. a redelivered message).
    pub async fn mark_started(
        pool: &PgPool,
        job_id: JobId,
        input_snapshot: &serde_json::Value,
    ) -> Result<Option<JobRecord>, sqlx::Error> {
        let query = format!(
            "UPDATE job_records \
             SET status_id = $2, started_at = NOW(), input_data = $3 \
             WHERE job_id = $1 AND status_id = $4 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, JobRecord>(&query)
            .bind(job_id)
            .bind(JobStatus::Started.id())
            .bind(input_snapshot)
            .bind(JobStatus::Pending.id())
            .fetch_optional(pool)
            .await
    }

    /// Transition `started -> success` with the job's result text.
    ///
    /// Sets `completed_at` and computes `duration_seconds` from `started_at`.
    pub async fn complete(
        pool: &PgPool,
        job_id: JobId,
        result: &str,
    ) -> Result<Option<JobRecord>, sqlx::Error> {
        let query = format!(
            "UPDATE job_records \
             SET status_id = $2, result = $3, completed_at = NOW(), \
                 duration_seconds = {DURATION_EXPR} \
             WHERE job_id = $1 AND status_id = $4 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, JobRecord>(&query)
            .bind(job_id)
            .bind(JobStatus::Success.id())
            .bind(result)
            .bind(JobStatus::Started.id())
            .fetch_optional(pool)
            .await
    }

    /// Transition `started -> failure` with the error text.
    ///
    /// Same timing bookkeeping as [`complete`](Self::complete). No automatic
    /// retry is performed.
    pub async fn fail(
        pool: &PgPool,
        job_id: JobId,
        error: &str,
    ) -> Result<Option<JobRecord>, sqlx::Error> {
        let query = format!(
            "UPDATE job_records \
             SET status_id = $2, error = $3, completed_at = NOW(), \
                 duration_seconds = {DURATION_EXPR} \
             WHERE job_id = $1 AND status_id = $4 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, JobRecord>(&query)
            .bind(job_id)
            .bind(JobStatus::Failure.id())
            .bind(error)
            .bind(JobStatus::Started.id())
            .fetch_optional(pool)
            .await
    }

    /// Find a record by its external job id.
    pub async fn find_by_job_id(
        pool: &PgPool,
        job_id: JobId,
    ) -> Result<Option<JobRecord>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM job_records WHERE job_id = $1");
        sqlx::query_as::<_, JobRecord>(&query)
            .bind(job_id)
            .fetch_optional(pool)
            .await
    }

    /// List records, newest first, with optional filters and pagination.
    pub async fn list(
        pool: &PgPool,
        filter: &JobRecordFilter,
    ) -> Result<Vec<JobRecord>, sqlx::Error> {
        let limit = filter.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        let offset = filter.offset.unwrap_or(0).max(0);

        // Build the WHERE clause and track the next bind parameter index.
        let mut conditions: Vec<String> = Vec::new();
        let mut bind_idx: u32 = 1;

        if filter.job_type.is_some() {
            conditions.push(format!("job_type = ${bind_idx}"));
            bind_idx += 1;
        }

        if filter.status.is_some() {
            conditions.push(format!("status_id = ${bind_idx}"));
            bind_idx += 1;
        }

        if filter.search.is_some() {
            conditions.push(format!(
                "(job_id::TEXT ILIKE ${bind_idx} OR job_type ILIKE ${bind_idx} \
                  OR result ILIKE ${bind_idx} OR error ILIKE ${bind_idx})"
            ));
            bind_idx += 1;
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let query = format!(
            "SELECT {COLUMNS} FROM job_records \
             {where_clause} \
             ORDER BY created_at DESC, id DESC \
             LIMIT ${bind_idx} OFFSET ${}",
            bind_idx + 1,
        );

        let mut q = sqlx::query_as::<_, JobRecord>(&query);

        if let Some(job_type) = filter.job_type {
            q = q.bind(job_type.as_str());
        }
        if let Some(status) = filter.status {
            q = q.bind(status.id());
        }
        if let Some(search) = &filter.search {
            q = q.bind(format!("%{}%", escape_like(search)));
        }

        q = q.bind(limit).bind(offset);

        q.fetch_all(pool).await
    }
}

/// Escape `%`, `_` and `\` so user input matches literally in ILIKE.
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
