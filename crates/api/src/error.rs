use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use curio_core::error::CoreError;
use curio_edits::EditError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `curio_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Missing or invalid credentials.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated but lacking the required role.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl From<EditError> for AppError {
    fn from(err: EditError) -> Self {
        match err {
            EditError::Core(core) => AppError::Core(core),
            EditError::Db(db) => AppError::Database(db),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Core(core) => classify_core_error(core),
            AppError::Database(err) => classify_sqlx_error(err),
            AppError::Unauthorized(msg) => {
                (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone())
            }
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Classify a domain error into an HTTP status, error code, and message.
///
/// - Missing edits and entities map to 404.
/// - Permission failures map to 403.
/// - Lifecycle conflicts (closed edit, update limit, stale snapshot or
///   status transition) map to 409.
/// - Everything payload- or input-shaped maps to 400.
fn classify_core_error(err: &CoreError) -> (StatusCode, &'static str, String) {
    use CoreError::*;

    let (status, code) = match err {
        EditNotFound | EntityNotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),

        UnauthorizedUpdate | UnauthorizedBot | UnauthorizedVote | OwnEditVote => {
            (StatusCode::FORBIDDEN, "FORBIDDEN")
        }

        EditAlreadyApplied | ClosedEdit | UpdateLimit | EntityDeleted { .. }
        | PrerequisiteFailed { .. } | InvalidVoteStatus(_) => (StatusCode::CONFLICT, "CONFLICT"),

        NoChanges | MissingRequiredField(_) | TargetIdMissing | MergeIdMissing
        | MergeTargetIsSource | NoMergeSources | InvalidStudio(_) | InvalidTag(_)
        | InvalidPerformer(_) | InvalidImage(_) | InvalidSite(_)
        | UnsupportedPayloadVersion(_) | PayloadMismatch | MalformedPayload(_) => {
            (StatusCode::BAD_REQUEST, "VALIDATION_ERROR")
        }

        InvalidStoredValue(_) => {
            tracing::error!(error = %err, "Corrupt stored value");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            );
        }
    };

    (status, code, err.to_string())
}

/// Classify a sqlx error into an HTTP status, error code, and message.
///
/// - `RowNotFound` maps to 404.
/// - Unique constraint violations map to 409.
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
                return (
                    StatusCode::CONFLICT,
                    "CONFLICT",
                    format!("Duplicate value violates unique constraint: {constraint}"),
                );
            }
            tracing::error!(error = %db_err, "Database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
        other => {
            tracing::error!(error = %other, "Database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
    }
}
