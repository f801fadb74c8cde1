//! Success envelope for API handlers.
//!
//! Every successful response is `{ "success": true, ... }` with the payload's
//! fields flattened next to the flag, matching the error envelope produced by
//! [`AppError`](crate::error::AppError).

use serde::Serialize;

/// Standard `{ "success": true, ...T }` response envelope.
///
/// `T` must serialize as a map or struct.
///
/// # Example
///
/// ```ignore
/// Ok(Json(SuccessResponse::new(RegistrationCreated { id })))
/// ```
#[derive(Debug, Serialize)]
pub struct SuccessResponse<T: Serialize> {
    pub success: bool,
    #[serde(flatten)]
    pub body: T,
}

impl<T: Serialize> SuccessResponse<T> {
    pub fn new(body: T) -> Self {
        Self {
            success: true,
            body,
        }
    }
}
