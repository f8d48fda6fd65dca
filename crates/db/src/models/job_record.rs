//! Job record entity, API view, and listing DTOs.

use jobrelay_core::job_type::JobType;
use jobrelay_core::types::{DbId, JobId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::status::{JobStatus, StatusId};

/// A row from the `job_records` table.
#[derive(Debug, Clone, FromRow)]
pub struct JobRecord {
    pub id: DbId,
    pub job_id: JobId,
    pub job_type: String,
    pub status_id: StatusId,
    pub input_data: serde_json::Value,
    pub result: Option<String>,
    pub error: Option<String>,
    pub started_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    pub duration_seconds: Option<f64>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl JobRecord {
    pub fn status(&self) -> Option<JobStatus> {
        JobStatus::from_id(self.status_id)
    }
}

/// The external representation of a job record.
///
/// `task_id` / `task_type` keep the field names clients already use.
#[derive(Debug, Clone, Serialize)]
pub struct JobRecordView {
    pub task_id: JobId,
    pub task_type: String,
    pub status: &'static str,
    pub input_data: serde_json::Value,
    pub result: Option<String>,
    pub error: Option<String>,
    pub created_at: Timestamp,
    pub started_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    pub duration_seconds: Option<f64>,
}

impl From<JobRecord> for JobRecordView {
    fn from(record: JobRecord) -> Self {
        let status = record.status().map_or("unknown", JobStatus::name);
        Self {
            task_id: record.job_id,
            task_type: record.job_type,
            status,
            input_data: record.input_data,
            result: record.result,
            error: record.error,
            created_at: record.created_at,
            started_at: record.started_at,
            completed_at: record.completed_at,
            duration_seconds: record.duration_seconds,
        }
    }
}

/// Query parameters for `GET /api/tasks/`.
#[derive(Debug, Default, Deserialize)]
pub struct JobRecordListQuery {
    /// Filter by job type name (e.g. `add_numbers`).
    pub job_type: Option<String>,
    /// Filter by status name (e.g. `failure`).
    pub status: Option<String>,
    /// Case-insensitive substring match on id, type, result and error.
    pub search: Option<String>,
    /// Maximum number of results. Defaults to 50, capped at 100.
    pub limit: Option<i64>,
    /// Number of results to skip. Defaults to 0.
    pub offset: Option<i64>,
}

/// Resolved, typed filter handed to the repository.
#[derive(Debug, Default, Clone)]
pub struct JobRecordFilter {
    pub job_type: Option<JobType>,
    pub status: Option<JobStatus>,
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl TryFrom<JobRecordListQuery> for JobRecordFilter {
    type Error = jobrelay_core::error::CoreError;

    fn try_from(query: JobRecordListQuery) -> Result<Self, Self::Error> {
        let job_type = query.job_type.as_deref().map(str::parse).transpose()?;
        let status = query.status.as_deref().map(str::parse).transpose()?;
        let search = query
            .search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        Ok(Self {
            job_type,
            status,
            search,
            limit: query.limit,
            offset: query.offset,
        })
    }
}
