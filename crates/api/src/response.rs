//! Shared response envelope types for API handlers.
//!
//! Read endpoints use a `{ "data": ... }` envelope. Task submission keeps the
//! flat `{ "status", "task_id", "message" }` shape clients already parse.

use jobrelay_core::types::JobId;
use jobrelay_queue::Dispatched;
use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

/// Body returned when a task has been queued.
#[derive(Debug, Serialize)]
pub struct TaskAccepted {
    pub status: &'static str,
    pub task_id: JobId,
    pub message: String,
}

impl From<Dispatched> for TaskAccepted {
    fn from(dispatched: Dispatched) -> Self {
        Self {
            status: "success",
            task_id: dispatched.job_id,
            message: dispatched.message,
        }
    }
}
