use axum::routing::{get, post};
use axum::Router;

use crate::handlers::tasks;
use crate::state::AppState;

/// Task submission and query routes, mounted under `/api`.
///
/// Submission routes answer every method other than POST with 405.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/add-task/",
            post(tasks::add_task).fallback(tasks::post_required),
        )
        .route(
            "/email-task/",
            post(tasks::email_task).fallback(tasks::post_required),
        )
        .route(
            "/process-task/",
            post(tasks::process_task).fallback(tasks::post_required),
        )
        .route("/tasks/", get(tasks::list_tasks))
        .route("/tasks/{task_id}", get(tasks::get_task))
}
