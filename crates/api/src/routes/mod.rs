pub mod health;
pub mod tasks;

use axum::Router;

use crate::state::AppState;

/// Build the `/api` route tree.
///
/// ```text
/// /add-task/                 POST   enqueue add_numbers
/// /email-task/               POST   enqueue send_email
/// /process-task/             POST   enqueue process_data
/// /tasks/                    GET    list job records
/// /tasks/{task_id}           GET    one job record
/// ```
pub fn api_routes() -> Router<AppState> {
    tasks::router()
}
