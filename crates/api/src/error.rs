use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use slotbook_core::error::CoreError;
use slotbook_db::reservations::ReservationError;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce the uniform
/// `{ "success": false, "message", "code" }` envelope.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `slotbook_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl From<ReservationError> for AppError {
    fn from(err: ReservationError) -> Self {
        match err {
            ReservationError::Core(core) => AppError::Core(core),
            ReservationError::Database(db) => AppError::Database(db),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut full = false;
        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, key } => {
                    tracing::debug!(entity = %entity, key = %key, "Lookup found nothing");
                    (
                        StatusCode::NOT_FOUND,
                        "NOT_FOUND",
                        not_found_message(entity),
                    )
                }
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::SlotFull { slot_id } => {
                    full = true;
                    (
                        StatusCode::CONFLICT,
                        "SLOT_FULL",
                        format!("Selected slot(s) are no longer available (slot {slot_id})"),
                    )
                }
                CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        "An internal error occurred".to_string(),
                    )
                }
            },

            // --- Database errors ---
            AppError::Database(err) => classify_sqlx_error(err),

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
        };

        let mut body = json!({
            "success": false,
            "message": message,
            "code": code,
        });
        if full {
            body["full"] = json!(true);
        }

        (status, axum::Json(body)).into_response()
    }
}

/// User-facing text for a failed lookup. Keys are not echoed back.
fn not_found_message(entity: &str) -> String {
    match entity {
        "Registration" | "Participant" => "Participant not found".to_string(),
        other => format!("{other} not found"),
    }
}

/// Classify a sqlx error into an HTTP status, error code, and message.
///
/// - `RowNotFound` maps to 404.
/// - Unique constraint violations (constraint name starting with `uq_`) map to 409.
/// - Deadlocks and serialization failures that outlived the coordinator's
///   retries map to 503 so the caller can resubmit.
/// - Everything else maps to 500 with a sanitized message.
fn classify_sqlx_error(err: &sqlx::Error) -> (StatusCode, &'static str, String) {
    if slotbook_db::is_retryable(err) {
        tracing::warn!(error = %err, "Transient database conflict");
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            "TRANSIENT",
            "Temporary database conflict, please retry".to_string(),
        );
    }

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
                    return (StatusCode::CONFLICT, "CONFLICT", conflict_message(constraint));
                }
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

fn conflict_message(constraint: &str) -> String {
    match constraint {
        "uq_waitlist_entries_event_mobile" => "Mobile number already exists".to_string(),
        "uq_registrations_event_identity" => {
            "A registration for this participant is already being processed".to_string()
        }
        other => format!("Duplicate value violates unique constraint: {other}"),
    }
}
