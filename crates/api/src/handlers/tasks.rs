//! Handlers for task submission and job record queries.
//!
//! Submission endpoints return as soon as the job is on the queue; the
//! record can then be polled through `/api/tasks/{task_id}`.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use jobrelay_core::error::CoreError;
use jobrelay_core::job_type::JobType;
use jobrelay_db::models::job_record::{JobRecordFilter, JobRecordListQuery, JobRecordView};
use jobrelay_db::repositories::JobRecordRepo;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::extract::TaskParams;
use crate::response::{DataResponse, TaskAccepted};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn submit(
    state: &AppState,
    job_type: JobType,
    params: &serde_json::Map<String, serde_json::Value>,
) -> AppResult<Json<TaskAccepted>> {
    let dispatched = state.dispatcher.dispatch_params(job_type, params).await?;
    Ok(Json(TaskAccepted::from(dispatched)))
}

// ---------------------------------------------------------------------------
// Submit
// ---------------------------------------------------------------------------

/// POST /api/add-task/
///
/// Body: `x`, `y` (integers).
pub async fn add_task(
    State(state): State<AppState>,
    TaskParams(params): TaskParams,
) -> AppResult<impl IntoResponse> {
    submit(&state, JobType::AddNumbers, &params).await
}

/// POST /api/email-task/
///
/// Body: `email`, `subject`, `message`.
pub async fn email_task(
    State(state): State<AppState>,
    TaskParams(params): TaskParams,
) -> AppResult<impl IntoResponse> {
    submit(&state, JobType::SendEmail, &params).await
}

/// POST /api/process-task/
///
/// Body: `data`.
pub async fn process_task(
    State(state): State<AppState>,
    TaskParams(params): TaskParams,
) -> AppResult<impl IntoResponse> {
    submit(&state, JobType::ProcessData, &params).await
}

/// Fallback for any non-POST method on a submission endpoint.
pub async fn post_required() -> AppError {
    AppError::PostRequired
}

// ---------------------------------------------------------------------------
// Query
// ---------------------------------------------------------------------------

/// GET /api/tasks/
///
/// Newest first. Supports `job_type`, `status`, `search`, `limit` and
/// `offset` query parameters.
pub async fn list_tasks(
    State(state): State<AppState>,
    query: Result<Query<JobRecordListQuery>, QueryRejection>,
) -> AppResult<impl IntoResponse> {
    let Query(params) = query?;
    let filter = JobRecordFilter::try_from(params)?;
    let records = JobRecordRepo::list(&state.pool, &filter).await?;
    let data: Vec<JobRecordView> = records.into_iter().map(JobRecordView::from).collect();
    Ok(Json(DataResponse { data }))
}

/// GET /api/tasks/{task_id}
pub async fn get_task(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let job_id = Uuid::parse_str(&task_id)
        .map_err(|_| CoreError::Validation(format!("Invalid task id '{task_id}'")))?;

    let record = JobRecordRepo::find_by_job_id(&state.pool, job_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Task",
            id: job_id.to_string(),
        })?;

    Ok(Json(DataResponse {
        data: JobRecordView::from(record),
    }))
}
