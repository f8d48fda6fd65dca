use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::{BytesRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use jobrelay_core::error::CoreError;
use jobrelay_queue::QueueError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Every variant renders as `{ "status": "error", "message": ..., "code": ... }`.
/// Infrastructure failures are logged and returned with a sanitized message.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `jobrelay_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A dispatch failure (validation, job store or broker).
    #[error(transparent)]
    Queue(#[from] QueueError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The endpoint exists but only accepts POST.
    #[error("POST required")]
    PostRequired,

    /// An extractor rejection, rendered with the rejection's own status.
    #[error("Request rejected ({status}): {message}")]
    Rejected { status: StatusCode, message: String },
}

macro_rules! impl_from_rejection {
    ($($rejection:ty),+ $(,)?) => {
        $(
            impl From<$rejection> for AppError {
                fn from(rejection: $rejection) -> Self {
                    AppError::Rejected {
                        status: rejection.status(),
                        message: rejection.body_text(),
                    }
                }
            }
        )+
    };
}

impl_from_rejection!(QueryRejection, BytesRejection, MultipartRejection, MultipartError);

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Core(core) => classify_core_error(core),

            AppError::Queue(queue) => match queue {
                QueueError::Core(core) => classify_core_error(core),
                QueueError::Store(err) => {
                    tracing::error!(error = %err, "Job store unavailable during dispatch");
                    internal()
                }
                QueueError::Broker(err) => {
                    tracing::error!(error = %err, "Broker unavailable during dispatch");
                    internal()
                }
            },

            AppError::Database(err) => classify_sqlx_error(err),

            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::PostRequired => (
                StatusCode::METHOD_NOT_ALLOWED,
                "METHOD_NOT_ALLOWED",
                "POST required".to_string(),
            ),
            AppError::Rejected { status, message } => classify_rejection(*status, message),
        };

        let body = json!({
            "status": "error",
            "message": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

fn internal() -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}

fn classify_core_error(core: &CoreError) -> (StatusCode, &'static str, String) {
    match core {
        CoreError::NotFound { entity, id } => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{entity} with id {id} not found"),
        ),
        CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
    }
}

fn classify_rejection(status: StatusCode, message: &str) -> (StatusCode, &'static str, String) {
    if status.is_server_error() {
        tracing::error!(%status, error = %message, "Request body could not be read");
        return internal();
    }
    let code = match status {
        StatusCode::PAYLOAD_TOO_LARGE => "PAYLOAD_TOO_LARGE",
        StatusCode::UNSUPPORTED_MEDIA_TYPE => "UNSUPPORTED_MEDIA_TYPE",
        _ => "BAD_REQUEST",
    };
    (status, code, message.to_string())
}

/// Classify a sqlx error into an HTTP status, error code, and message.
///
/// - `RowNotFound` maps to 404.
/// - Unique constraint violations (constraint name starting with `uq_`) map to 409.
/// - Everything else maps to 500 with a sanitized message.
fn classify_sqlx_error(err: &sqlx::Error) -> (StatusCode, &'static str, String) {
    match err {
        sqlx::Error::RowNotFound => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        ),
        sqlx::Error::Database(db_err) => {
            // PostgreSQL unique constraint violation: error code 23505
            if db_err.code().as_deref() == Some("23505") {
                let constraint = db_err.constraint().unwrap_or("unknown");
                if constraint.starts_with("uq_") {
                    return (
                        StatusCode::CONFLICT,
                        "CONFLICT",
                        format!("Duplicate value violates unique constraint: {constraint}"),
                    );
                }
            }
            tracing::error!(error = %db_err, "Database error");
            internal()
        }
        other => {
            tracing::error!(error = %other, "Database error");
            internal()
        }
    }
}
